//! HTML dashboard with Chart.js bar charts
//!
//! The same page serves two modes. A static report embeds one
//! [`DashboardView`] and disables the selectors. A live page (served by
//! `transboard serve`) asks the API for a fresh view whenever a selector
//! changes.

use crate::dashboard::DashboardView;
use std::io::{self, Write};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Transition Durations</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
    <style>
        :root {
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --error: #f85149;
            --accent: #58a6ff;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }
        .container { max-width: 1600px; margin: 0 auto; padding: 2rem; }

        /* Header */
        .header {
            display: flex;
            align-items: flex-end;
            justify-content: space-between;
            gap: 1rem;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border);
        }
        .logo {
            font-size: 2.5rem;
            font-weight: 800;
            background: linear-gradient(135deg, var(--accent), #a371f7);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
        }
        .subtitle { color: var(--dim); font-size: 1rem; }

        /* Filters */
        .filters { display: flex; gap: 1rem; flex-wrap: wrap; }
        .filters label { display: flex; flex-direction: column; font-size: 0.75rem; color: var(--dim); text-transform: uppercase; letter-spacing: 0.05em; }
        .filters select {
            margin-top: 0.25rem;
            background: var(--card);
            color: var(--text);
            border: 1px solid var(--border);
            border-radius: 6px;
            padding: 0.375rem 0.75rem;
            font-size: 0.875rem;
        }

        /* Stats Row */
        .stats {
            display: grid;
            grid-template-columns: repeat(3, 1fr);
            gap: 1rem;
            margin-bottom: 2rem;
        }
        .stat {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.5rem;
            text-align: center;
        }
        .stat-value { font-size: 3rem; font-weight: 700; line-height: 1; }
        .stat-label { color: var(--dim); font-size: 0.875rem; text-transform: uppercase; letter-spacing: 0.05em; margin-top: 0.5rem; }

        /* Charts Grid */
        #charts-container {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(480px, 1fr));
            gap: 1.5rem;
            margin-bottom: 2rem;
        }
        .chart-block {
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.5rem;
        }
        .chart-block h4 {
            font-size: 1rem;
            font-weight: 600;
            margin-bottom: 1rem;
            color: var(--dim);
            font-family: 'SF Mono', 'Fira Code', monospace;
        }
        .chart-container { position: relative; height: 260px; }
        .error { color: var(--error); font-weight: 600; }
        .empty { color: var(--dim); }

        .footer { color: var(--dim); font-size: 0.8rem; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <div>
                <div class="logo">Transitions</div>
                <div class="subtitle">Last updated: <span id="last-updated-time">-</span></div>
            </div>
            <div class="filters">
                <label>Time window
                    <select id="time-filter">
                        <option value="all">All time</option>
                        <option value="1">Last day</option>
                        <option value="7">Last 7 days</option>
                        <option value="30">Last 30 days</option>
                        <option value="90">Last 90 days</option>
                    </select>
                </label>
                <label>Time unit
                    <select id="time-unit">
                        <option value="minutes">Minutes</option>
                        <option value="hours">Hours</option>
                        <option value="days">Days</option>
                    </select>
                </label>
                <label>Batch
                    <select id="batch-name-filter">
                        <option value="all">All batches</option>
                    </select>
                </label>
            </div>
        </div>

        <div class="stats">
            <div class="stat">
                <div class="stat-value" id="stat-shown">-</div>
                <div class="stat-label">Shown</div>
            </div>
            <div class="stat">
                <div class="stat-value" id="stat-total">-</div>
                <div class="stat-label">Total Transitions</div>
            </div>
            <div class="stat">
                <div class="stat-value" id="stat-types">-</div>
                <div class="stat-label">Transition Types</div>
            </div>
        </div>

        <div id="charts-container"></div>

        <div class="footer">Generated {{GENERATED}}</div>
    </div>

    <script>
    const EMBEDDED = {{VIEW_JSON}};
    const API_URL = {{API_URL}};

    const timeFilterSelector = document.getElementById('time-filter');
    const timeUnitSelector = document.getElementById('time-unit');
    const batchNameSelector = document.getElementById('batch-name-filter');
    const chartsContainer = document.getElementById('charts-container');
    const selectors = [timeFilterSelector, timeUnitSelector, batchNameSelector];
    let batchOptionsFilled = false;

    function showError(message) {
        chartsContainer.innerHTML = '';
        const p = document.createElement('p');
        p.className = 'error';
        p.textContent = message;
        chartsContainer.appendChild(p);
    }

    function ensureOption(selector, value) {
        if (![...selector.options].some(o => o.value === value)) {
            selector.add(new Option(value, value));
        }
        selector.value = value;
    }

    function fillBatchOptions(names) {
        names.forEach(name => batchNameSelector.add(new Option(name, name)));
        batchOptionsFilled = true;
    }

    function renderChart(spec) {
        const block = document.createElement('div');
        block.className = 'chart-block';

        const title = document.createElement('h4');
        title.textContent = spec.title;

        const canvasContainer = document.createElement('div');
        canvasContainer.className = 'chart-container';
        const canvas = document.createElement('canvas');
        canvasContainer.appendChild(canvas);

        block.appendChild(title);
        block.appendChild(canvasContainer);
        chartsContainer.appendChild(block);

        new Chart(canvas.getContext('2d'), {
            type: 'bar',
            data: {
                labels: spec.labels,
                datasets: [{
                    label: spec.dataset_label,
                    data: spec.values,
                    backgroundColor: spec.color
                }]
            },
            options: {
                maintainAspectRatio: false,
                scales: {
                    y: { beginAtZero: spec.begin_at_zero, title: { display: true, text: spec.y_title }, suggestedMax: spec.suggested_max, ticks: { precision: 0 } },
                    x: { title: { display: true, text: spec.x_title } }
                }
            }
        });
    }

    function applyView(view) {
        if (view.status === 'failed') {
            showError(view.message);
            return;
        }
        if (!batchOptionsFilled) fillBatchOptions(view.batch_options);
        ensureOption(timeFilterSelector, view.selection.days);
        ensureOption(timeUnitSelector, view.selection.unit);
        ensureOption(batchNameSelector, view.selection.batch);

        document.getElementById('last-updated-time').textContent = view.updated_text;
        document.getElementById('stat-shown').textContent = view.shown;
        document.getElementById('stat-total').textContent = view.total;
        document.getElementById('stat-types').textContent = view.charts.length;

        chartsContainer.innerHTML = '';
        if (view.charts.length === 0) {
            const p = document.createElement('p');
            p.className = 'empty';
            p.textContent = 'No transitions match the current filters.';
            chartsContainer.appendChild(p);
        }
        view.charts.forEach(renderChart);
    }

    // The first request sends no selection so the server defaults apply
    async function refresh(initial) {
        const params = new URLSearchParams({
            days: timeFilterSelector.value,
            unit: timeUnitSelector.value,
            batch: batchNameSelector.value
        });
        try {
            const response = await fetch(initial ? API_URL : `${API_URL}?${params}`);
            const body = await response.json().catch(() => ({}));
            if (!response.ok) throw new Error(body.error || 'Failed to fetch data');
            applyView(body);
        } catch (error) {
            console.error('Error refreshing dashboard:', error);
            showError(`Error: ${error.message}`);
        }
    }

    if (API_URL) {
        if (EMBEDDED) applyView(EMBEDDED);
        selectors.forEach(selector => selector.addEventListener('change', () => refresh(false)));
        if (!EMBEDDED) refresh(true);
    } else {
        selectors.forEach(selector => selector.disabled = true);
        applyView(EMBEDDED);
    }
    </script>
</body>
</html>
"#;

/// Write the dashboard page.
///
/// `view` is embedded as the first frame. With `api_url` set the selectors
/// stay live and fetch new views from it; without, the page is static.
pub fn write<W: Write>(writer: &mut W, view: Option<&DashboardView>, api_url: Option<&str>) -> io::Result<()> {
    let view_json = match view {
        Some(view) => script_json(&serde_json::to_string(view)?),
        None => "null".to_string(),
    };
    let api_json = match api_url {
        Some(url) => script_json(&serde_json::to_string(url)?),
        None => "null".to_string(),
    };
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let page = TEMPLATE
        .replace("{{GENERATED}}", &generated)
        .replace("{{API_URL}}", &api_json)
        .replace("{{VIEW_JSON}}", &view_json);

    writer.write_all(page.as_bytes())
}

/// Keep JSON from closing the surrounding `<script>` element
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
