use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::charts::{self, Tab};
use crate::dataset::Dataset;
use crate::stats::{MatchStatsEngine, StatsReport};

/// Shown until both files have been supplied
pub const UPLOAD_PROMPT: &str =
    "Please upload both matches.csv and deliveries.csv files from the IPL Kaggle dataset.";

#[derive(Clone)]
pub struct AppState {
    /// Largest accepted upload request body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct RenderedChart {
    pub id: &'static str,
    pub tab: Tab,
    pub title: &'static str,
    pub svg: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub report: StatsReport,
    pub charts: Vec<RenderedChart>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    max_upload_bytes: usize,
}

type ApiError = (StatusCode, String);

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serve the dashboard HTML page, injecting the tab list.
async fn index_handler() -> impl IntoResponse {
    let tabs: Vec<(Tab, &str)> = Tab::ALL.iter().map(|t| (*t, t.title())).collect();
    let tabs_json = serde_json::to_string(&tabs).unwrap_or_else(|_| "[]".into());
    Html(DASHBOARD_HTML.replace("/*TABS*/[]", &tabs_json))
}

/// GET /api/health
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        max_upload_bytes: state.max_upload_bytes,
    })
}

/// POST /api/analyze (multipart fields `matches` and `deliveries`)
async fn analyze_handler(mut multipart: Multipart) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut matches: Option<Bytes> = None;
    let mut deliveries: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        // An untouched file input still posts an empty part
        if data.is_empty() {
            continue;
        }
        match name.as_str() {
            "matches" => matches = Some(data),
            "deliveries" => deliveries = Some(data),
            other => debug!("Ignoring upload field '{}'", other),
        }
    }

    let (Some(matches), Some(deliveries)) = (matches, deliveries) else {
        return Err((StatusCode::BAD_REQUEST, UPLOAD_PROMPT.to_string()));
    };
    info!(
        "Analyzing upload: matches={} bytes, deliveries={} bytes",
        matches.len(),
        deliveries.len()
    );

    let response = tokio::task::spawn_blocking(move || analyze(&matches, &deliveries))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    Ok(Json(response))
}

/// Parse, aggregate and render one upload.
fn analyze(matches: &[u8], deliveries: &[u8]) -> Result<AnalyzeResponse, ApiError> {
    let data = Dataset::from_bytes(matches, deliveries).map_err(|e| {
        warn!("Rejected upload: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;
    let report = MatchStatsEngine::new(data).report().map_err(|e| {
        warn!("Rejected upload: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    let mut rendered = Vec::new();
    for chart in charts::charts_for(&report) {
        let svg = charts::render_svg(&chart)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        rendered.push(RenderedChart {
            id: chart.id,
            tab: chart.tab,
            title: chart.title,
            svg,
        });
    }

    Ok(AnalyzeResponse {
        report,
        charts: rendered,
    })
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>IPL Cricket EDA Dashboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; display: grid; grid-template-columns: 280px 1fr; min-height: 100vh; }
  aside { border-right: 1px solid var(--border); padding: 1.5rem; display: flex; flex-direction: column; gap: 1rem; }
  aside h2 { font-size: 1rem; }
  aside label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; }
  aside input[type=file] { width: 100%; color: var(--muted); font-size: .8rem; }
  .btn { background: var(--accent); border: none; color: #fff; padding: .5rem .9rem; border-radius: 6px; cursor: pointer; font-weight: 600; }
  .btn:disabled { opacity: .5; cursor: wait; }
  .notice { padding: .7rem .9rem; border-radius: 8px; font-size: .85rem; }
  .notice.info { background: rgba(108,99,255,.15); color: var(--accent); }
  .notice.success { background: rgba(0,200,150,.15); color: var(--green); }
  .notice.error { background: rgba(255,79,106,.15); color: var(--red); }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; align-content: start; }
  header h1 { font-size: 1.6rem; font-weight: 700; }
  .tabs { display: flex; gap: .5rem; border-bottom: 1px solid var(--border); }
  .tab { background: none; border: none; color: var(--muted); padding: .6rem 1rem; cursor: pointer; font-size: .9rem; border-bottom: 2px solid transparent; }
  .tab.active { color: var(--text); border-bottom-color: var(--accent); }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; }
  .panel-body { padding: 1rem; background: #fff; }
  .panel-body svg { width: 100%; height: auto; }
  .stat-card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; max-width: 320px; }
  .stat-card .label { color: var(--muted); font-size: .8rem; text-transform: uppercase; letter-spacing: .06em; margin-bottom: .4rem; }
  .stat-card .value { font-size: 1.7rem; font-weight: 700; }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  .skipped { color: var(--muted); font-size: .8rem; }
</style>
</head>
<body>
<aside>
  <h2>Upload Datasets</h2>
  <form id="upload-form">
    <label for="matches">Upload matches.csv</label>
    <input type="file" id="matches" name="matches" accept=".csv">
    <br><br>
    <label for="deliveries">Upload deliveries.csv</label>
    <input type="file" id="deliveries" name="deliveries" accept=".csv">
    <br><br>
    <button class="btn" id="analyze-btn" type="submit">Analyze</button>
  </form>
  <div id="sidebar-status"></div>
  <div class="skipped" id="skipped"></div>
</aside>

<main>
  <header><h1>IPL Cricket EDA Dashboard</h1></header>
  <div class="notice info" id="prompt">Please upload both matches.csv and deliveries.csv files from the IPL Kaggle dataset.</div>
  <nav class="tabs" id="tabs"></nav>
  <section id="tab-body"></section>
</main>

<script>
const TABS = /*TABS*/[];
let current = null;
let activeTab = TABS.length ? TABS[0][0] : null;

function renderTabs() {
  const nav = document.getElementById('tabs');
  if (!current) { nav.innerHTML = ''; return; }
  nav.innerHTML = TABS.map(([id, title]) =>
    `<button class="tab ${id === activeTab ? 'active' : ''}" data-tab="${id}">${title}</button>`
  ).join('');
  nav.querySelectorAll('.tab').forEach(b => b.onclick = () => { activeTab = b.dataset.tab; renderTabs(); });
  renderBody();
}

function renderBody() {
  const body = document.getElementById('tab-body');
  const parts = [];
  if (activeTab === 'toss_analysis') {
    const pct = current.report.toss_impact_pct;
    parts.push(`<div class="stat-card"><div class="label">Toss Winner also won match (%)</div>
      <div class="value">${pct != null ? pct.toFixed(2) + '%' : '–'}</div></div>`);
  }
  const charts = current.charts.filter(c => c.tab === activeTab);
  charts.forEach(c => parts.push(`<div class="panel"><div class="panel-header">${c.title}</div>
    <div class="panel-body">${c.svg}</div></div>`));
  if (!parts.length) parts.push('<div class="empty">No charts available for this dataset</div>');
  body.innerHTML = parts.join('');
}

function setStatus(kind, text) {
  document.getElementById('sidebar-status').innerHTML = text ? `<div class="notice ${kind}">${text}</div>` : '';
}

document.getElementById('upload-form').addEventListener('submit', async ev => {
  ev.preventDefault();
  const btn = document.getElementById('analyze-btn');
  const prompt = document.getElementById('prompt');
  btn.disabled = true;
  setStatus('info', 'Analyzing…');
  try {
    const r = await fetch('/api/analyze', { method: 'POST', body: new FormData(ev.target) });
    if (!r.ok) {
      const msg = await r.text();
      current = null;
      renderTabs();
      document.getElementById('tab-body').innerHTML = '';
      if (r.status === 400) { prompt.style.display = ''; prompt.textContent = msg; setStatus('', ''); }
      else { setStatus('error', msg); }
      return;
    }
    current = await r.json();
    prompt.style.display = 'none';
    setStatus('success', 'Datasets loaded successfully!');
    const skipped = current.report.skipped || [];
    document.getElementById('skipped').textContent = skipped.length
      ? 'Skipped: ' + skipped.map(s => s.query.replace(/_/g, ' ')).join(', ')
      : '';
    renderTabs();
  } catch (e) {
    setStatus('error', String(e));
  } finally {
    btn.disabled = false;
  }
});
</script>
</body>
</html>"#;
