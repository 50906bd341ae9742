//! Server-side HTML for the dashboard page, charts drawn as inline SVG.

use std::fmt::{self, Write};

use crate::analysis::{MonthlyCount, StateCount};
use crate::dashboard::{DATE_FORMAT, DashboardView};
use crate::error::Result;

pub const PAGE_TITLE: &str = "Dashboard de Vendas Olist 📊";
pub const STATE_CHART_TITLE: &str = "Número de Pedidos por Estado";
pub const MONTHLY_CHART_TITLE: &str = "Vendas Mensais ao Longo do Tempo";

const CHART_WIDTH: f64 = 900.0;
const BAR_HEIGHT: f64 = 22.0;
const LINE_CHART_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 60.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 60.0;

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex}\
aside{width:260px;padding:1rem;background:#f0f2f6;min-height:100vh}\
main{flex:1;padding:1rem 2rem}\
.metrics{display:flex;gap:2rem}\
.metric{flex:1}.metric .value{font-size:2.2rem}\
select,input{width:100%;margin-bottom:1rem}\
svg text{font-size:12px}";

/// Escapes text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn collect(write: impl FnOnce(&mut String) -> fmt::Result) -> Result<String> {
    let mut out = String::new();
    write(&mut out)?;
    Ok(out)
}

pub fn render_page(view: &DashboardView) -> Result<String> {
    collect(|html| write_page(html, view))
}

pub fn render_state_chart(counts: &[StateCount]) -> Result<String> {
    collect(|svg| write_state_chart(svg, counts))
}

pub fn render_monthly_chart(series: &[MonthlyCount]) -> Result<String> {
    collect(|svg| write_monthly_chart(svg, series))
}

fn write_page(html: &mut String, view: &DashboardView) -> fmt::Result {
    write!(
        html,
        "<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\">\
         <title>{title}</title><style>{STYLE}</style></head><body>",
        title = escape(PAGE_TITLE)
    )?;
    write_sidebar(html, view)?;
    write!(html, "<main><h1>{}</h1><hr>", escape(PAGE_TITLE))?;
    write_metrics(html, view)?;
    html.push_str("<hr><h2>Análises Visuais</h2>");
    write_state_chart(html, &view.orders_by_state)?;
    write_monthly_chart(html, &view.monthly_orders)?;
    html.push_str("</main></body></html>");
    Ok(())
}

fn write_sidebar(html: &mut String, view: &DashboardView) -> fmt::Result {
    html.push_str(
        "<aside><h2>Filtros Interativos</h2>\
         <form method=\"get\" action=\"/\">\
         <input type=\"hidden\" name=\"submitted\" value=\"1\">\
         <label for=\"states\">Selecione o Estado</label>\
         <select id=\"states\" name=\"states\" multiple size=\"10\" onchange=\"this.form.submit()\">",
    );
    for option in &view.state_options {
        let selected = if view.selection.states.contains(option) {
            " selected"
        } else {
            ""
        };
        let option = escape(option);
        write!(html, "<option value=\"{option}\"{selected}>{option}</option>")?;
    }
    html.push_str("</select>");

    let (min, max) = match view.date_bounds {
        Some(bounds) => (
            bounds.min.format(DATE_FORMAT).to_string(),
            bounds.max.format(DATE_FORMAT).to_string(),
        ),
        None => (String::new(), String::new()),
    };
    for (name, label, value) in [
        ("start", "Data Início", view.selection.start),
        ("end", "Data Fim", view.selection.end),
    ] {
        write!(
            html,
            "<label for=\"{name}\">{label}</label>\
             <input type=\"date\" id=\"{name}\" name=\"{name}\" value=\"{value}\" \
             min=\"{min}\" max=\"{max}\" onchange=\"this.form.submit()\">",
            value = value.format(DATE_FORMAT),
        )?;
    }
    html.push_str("<noscript><button type=\"submit\">Aplicar</button></noscript></form></aside>");
    Ok(())
}

fn write_metrics(html: &mut String, view: &DashboardView) -> fmt::Result {
    write!(
        html,
        "<h2>Métricas Principais</h2><div class=\"metrics\">\
         <div class=\"metric\"><div>Total de Pedidos</div><div class=\"value\">{}</div></div>\
         <div class=\"metric\"><div>Total de Clientes Únicos</div><div class=\"value\">{}</div></div>\
         </div>",
        view.metrics.total_orders, view.metrics.unique_customers
    )
}

/// Horizontal bars; `counts` is ascending so the largest bar ends up on top.
fn write_state_chart(svg: &mut String, counts: &[StateCount]) -> fmt::Result {
    write!(svg, "<section><h3>{}</h3>", escape(STATE_CHART_TITLE))?;
    if counts.is_empty() {
        svg.push_str("<p>Sem dados para os filtros selecionados.</p></section>");
        return Ok(());
    }

    let height = MARGIN_TOP + BAR_HEIGHT * counts.len() as f64 + MARGIN_BOTTOM;
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let max = counts.iter().map(|c| c.orders).max().unwrap_or(0).max(1) as f64;

    write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {CHART_WIDTH} {height}\" \
         width=\"100%\" role=\"img\" aria-label=\"{}\">",
        escape(STATE_CHART_TITLE)
    )?;
    for (row, count) in counts.iter().rev().enumerate() {
        let y = MARGIN_TOP + BAR_HEIGHT * row as f64;
        let width = plot_width * count.orders as f64 / max;
        let state = escape(&count.state);
        write!(
            svg,
            "<text x=\"{lx}\" y=\"{ty}\" text-anchor=\"end\">{state}</text>\
             <rect x=\"{MARGIN_LEFT}\" y=\"{by}\" width=\"{width:.1}\" height=\"{bh}\" fill=\"#636efa\"/>\
             <text x=\"{vx:.1}\" y=\"{ty}\">{orders}</text>",
            lx = MARGIN_LEFT - 6.0,
            ty = y + BAR_HEIGHT * 0.65,
            by = y + 2.0,
            bh = BAR_HEIGHT - 4.0,
            vx = MARGIN_LEFT + width + 4.0,
            orders = count.orders,
        )?;
    }
    let axis_y = height - MARGIN_BOTTOM + 30.0;
    write!(
        svg,
        "<text x=\"{x}\" y=\"{axis_y}\" text-anchor=\"middle\">Contagem de Pedidos</text>\
         <text x=\"12\" y=\"{ly}\" transform=\"rotate(-90 12 {ly})\" text-anchor=\"middle\">Estado</text>\
         </svg></section>",
        x = MARGIN_LEFT + plot_width / 2.0,
        ly = MARGIN_TOP + (height - MARGIN_TOP - MARGIN_BOTTOM) / 2.0,
    )
}

/// Line over month-end buckets, in order.
fn write_monthly_chart(svg: &mut String, series: &[MonthlyCount]) -> fmt::Result {
    write!(svg, "<section><h3>{}</h3>", escape(MONTHLY_CHART_TITLE))?;
    if series.is_empty() {
        svg.push_str("<p>Sem dados para os filtros selecionados.</p></section>");
        return Ok(());
    }

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = LINE_CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let max = series.iter().map(|m| m.orders).max().unwrap_or(0).max(1) as f64;
    let step = if series.len() > 1 {
        plot_width / (series.len() - 1) as f64
    } else {
        0.0
    };
    let point = |index: usize, orders: u64| {
        let x = MARGIN_LEFT + step * index as f64;
        let y = MARGIN_TOP + plot_height * (1.0 - orders as f64 / max);
        (x, y)
    };

    write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {CHART_WIDTH} {LINE_CHART_HEIGHT}\" \
         width=\"100%\" role=\"img\" aria-label=\"{}\">",
        escape(MONTHLY_CHART_TITLE)
    )?;

    let baseline = MARGIN_TOP + plot_height;
    write!(
        svg,
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{baseline}\" x2=\"{x2}\" y2=\"{baseline}\" stroke=\"#999\"/>\
         <text x=\"{lx}\" y=\"{ty}\" text-anchor=\"end\">{max}</text>\
         <text x=\"{lx}\" y=\"{baseline}\" text-anchor=\"end\">0</text>",
        x2 = MARGIN_LEFT + plot_width,
        lx = MARGIN_LEFT - 6.0,
        ty = MARGIN_TOP + 4.0,
        max = max as u64,
    )?;

    let points: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(index, month)| {
            let (x, y) = point(index, month.orders);
            format!("{x:.1},{y:.1}")
        })
        .collect();
    write!(
        svg,
        "<polyline fill=\"none\" stroke=\"#636efa\" stroke-width=\"2\" points=\"{}\"/>",
        points.join(" ")
    )?;

    // label roughly a dozen ticks so long ranges stay readable
    let every = series.len().div_ceil(12).max(1);
    for (index, month) in series.iter().enumerate() {
        let (x, y) = point(index, month.orders);
        write!(
            svg,
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"3\" fill=\"#636efa\">\
             <title>{}: {}</title></circle>",
            month.month_end.format(DATE_FORMAT),
            month.orders
        )?;
        if index % every == 0 {
            write!(
                svg,
                "<text x=\"{x:.1}\" y=\"{ty}\" text-anchor=\"middle\">{}</text>",
                month.month_end.format("%Y-%m"),
                ty = baseline + 18.0,
            )?;
        }
    }

    write!(
        svg,
        "<text x=\"{x}\" y=\"{ay}\" text-anchor=\"middle\">Mês da Compra</text>\
         <text x=\"12\" y=\"{ly}\" transform=\"rotate(-90 12 {ly})\" text-anchor=\"middle\">Total de Pedidos</text>\
         </svg></section>",
        x = MARGIN_LEFT + plot_width / 2.0,
        ay = LINE_CHART_HEIGHT - 12.0,
        ly = MARGIN_TOP + plot_height / 2.0,
    )
}
