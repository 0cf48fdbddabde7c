//! Operator HTML views
//!
//! Pure functions from already-ordered records to complete pages. Callers
//! sort with [`crate::display::sorted_by_timestamp`] first.

use std::fmt::Write;

use crate::display::TimeDisplay;
use crate::record::{SlotRecord, VisitRecord};

const BOOTSTRAP_RTL: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.rtl.min.css";

const CONFIRMED_STYLE: &str = "\
body{background:#181d22;color:#fff;}
.main-card{background:rgba(22,26,34,0.97);border-radius:25px;box-shadow:0 8px 32px 0 rgba(31,38,135,.25);max-width:520px;margin:50px auto 0;padding:32px 20px;}
h2{letter-spacing:2px;font-size:2em;font-weight:bold;text-align:center;margin-bottom:18px;color:#63e2ff;}
.table{border-radius:18px;overflow:hidden;}
.btn-info{background:#63e2ff;border:none;color:#161a22;}
.btn-info:hover{background:#18a6ff;color:#fff;}";

const VISITS_STYLE: &str = "\
body{font-family:'Cairo',sans-serif;background:linear-gradient(120deg,#222,#111 100%);min-height:100vh;color:#fafbfc;margin:0;}
.main-card{background:rgba(22,26,34,0.97);border-radius:25px;box-shadow:0 8px 32px 0 rgba(31,38,135,0.25);max-width:480px;margin:45px auto 0;padding:32px 24px 24px 24px;border:1px solid #2a2d36;}
h2{letter-spacing:2px;font-size:2.3em;font-weight:bold;text-align:center;margin-bottom:20px;color:#63e2ff;}
.times-table{margin-top:16px;background:rgba(40,48,70,0.87);border-radius:16px;overflow:hidden;}
.times-table th,.times-table td{padding:10px 14px;text-align:center;border-bottom:1px solid #2a2d36;}
.times-table th{color:#63e2ff;font-size:1.12em;background:#19202e;font-weight:bold;border-bottom:2px solid #444;}
.times-table tr:last-child td{border-bottom:none;}
.time-badge{background:linear-gradient(92deg,#18a6ff 20%,#19f7dc 80%);color:#141b25;font-size:1.12em;border-radius:10px;font-weight:700;letter-spacing:1.3px;padding:4px 14px;display:inline-block;margin:0 2px;}
.btn-outline-info{border:2px solid #63e2ff;color:#63e2ff;font-weight:bold;}
.btn-outline-info:hover{background:#63e2ff;color:#161a22;}
@media (max-width:550px){.main-card{max-width:97vw;padding:16px 4vw 10vw 4vw;}h2{font-size:1.5em;}}";

/// Placeholder row text for an empty confirmed list
pub const NO_CONFIRMED: &str = "لا توجد طلبات مؤكدة بعد";

/// Placeholder row text for an empty visit list
pub const NO_VISITS: &str = "لا يوجد أي دخول مسجل بعد.";

/// Escape text for HTML element and attribute content
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page_head(out: &mut String, title: &str, style: &str, extra_links: &[&str]) {
    out.push_str("<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", html_escape(title));
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(out, "<link href=\"{BOOTSTRAP_RTL}\" rel=\"stylesheet\">");
    for link in extra_links {
        let _ = writeln!(out, "<link href=\"{link}\" rel=\"stylesheet\">");
    }
    let _ = writeln!(out, "<style>\n{style}\n</style>");
    out.push_str("</head>\n<body>\n");
}

/// Confirmed requests page (`GET /`)
///
/// Columns: position, request time as stored, token.
pub fn render_confirmed(records: &[SlotRecord]) -> String {
    let mut out = String::with_capacity(2048 + records.len() * 96);
    page_head(&mut out, "SAMURAI GET", CONFIRMED_STYLE, &[]);

    out.push_str("<div class=\"main-card shadow-lg\">\n<h2>📒 Samurai GET</h2>\n");
    out.push_str(
        "<a href=\"/visits\" class=\"btn btn-info mb-3\" \
         style=\"width:100%;font-weight:bold;letter-spacing:1.5px;\">⏰ الانتقال إلى صفحة التايمر</a>\n",
    );
    out.push_str(
        "<table class=\"table table-dark table-bordered table-hover text-center align-middle mb-0\">\n\
         <thead><tr><th>#</th><th>ثانية إرسال الطلب</th><th>data</th></tr></thead>\n<tbody>\n",
    );

    if records.is_empty() {
        let _ = writeln!(
            out,
            "<tr><td colspan=\"3\" style=\"color:#bbb\">{NO_CONFIRMED}</td></tr>"
        );
    } else {
        for (i, record) in records.iter().enumerate() {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td style=\"direction:ltr\">{}</td></tr>",
                i + 1,
                html_escape(&record.timestamp),
                html_escape(&record.token)
            );
        }
    }

    out.push_str("</tbody>\n</table>\n</div>\n</body>\n</html>\n");
    out
}

/// Visit timer page (`GET /visits`)
///
/// Columns: position, timestamp passed through `display`.
pub fn render_visits(visits: &[VisitRecord], display: &TimeDisplay) -> String {
    let mut out = String::with_capacity(3072 + visits.len() * 96);
    page_head(
        &mut out,
        "SAMURAI TIME | Timer Monitor",
        VISITS_STYLE,
        &["https://fonts.googleapis.com/css2?family=Cairo:wght@500;700&display=swap"],
    );

    out.push_str("<div class=\"main-card shadow-lg\">\n<h2>⏰ SAMURAI TIME</h2>\n");
    out.push_str(
        "<a href=\"/\" class=\"btn btn-outline-info mb-3\" \
         style=\"width:100%;font-weight:bold;\">🔙 العودة إلى الطلبات</a>\n",
    );
    out.push_str(
        "<table class=\"table times-table table-hover table-borderless mb-0\">\n\
         <thead><tr><th>#</th><th>CALENDRIA TIME</th></tr></thead>\n<tbody>\n",
    );

    if visits.is_empty() {
        let _ = writeln!(
            out,
            "<tr><td colspan=\"2\" style=\"color:#999\">{NO_VISITS}</td></tr>"
        );
    } else {
        for (i, visit) in visits.iter().enumerate() {
            let _ = writeln!(
                out,
                "<tr><td style=\"font-weight:bold;\">{}</td>\
                 <td><span class=\"time-badge\">{}</span></td></tr>",
                i + 1,
                html_escape(&display.format(&visit.timestamp))
            );
        }
    }

    out.push_str("</tbody>\n</table>\n</div>\n</body>\n</html>\n");
    out
}
