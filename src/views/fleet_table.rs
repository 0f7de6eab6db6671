//! Vista HTML de la flota
//!
//! Página única con el estado de conexión, las tarjetas de resumen, las
//! alertas y la tabla de vehículos. Todo el texto que viene del manifiesto
//! o del host se escapa antes de insertarlo.

use std::fmt::Write;

use crate::dto::fleet_dto::{FleetResponse, VehicleRowDto};
use crate::models::StatusKind;
use crate::services::status_service::{RucAlert, Urgency};
use crate::utils::format::escape_html;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 1.5rem; color: #1f2933; }
.status { padding: .5rem .75rem; border-radius: 4px; background: #e3f8ff; }
.banner { padding: .75rem; border-radius: 4px; background: #ffe3e3; color: #8a1c1c; margin: 1rem 0; }
.cards { display: flex; gap: 1rem; margin: 1rem 0; }
.card { flex: 1; padding: 1rem; border: 1px solid #d9e2ec; border-radius: 6px; text-align: center; }
.card .value { font-size: 1.8rem; font-weight: 600; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: .5rem; border-bottom: 1px solid #e4e7eb; text-align: left; }
.badge { padding: .15rem .5rem; border-radius: 10px; font-size: .8rem; font-weight: 600; }
.badge.ok { background: #e3f9e5; color: #207227; }
.badge.warning { background: #fff3c4; color: #8d2b0b; }
.badge.critical { background: #ffe3e3; color: #ab091e; }
.badge.nodata { background: #e4e7eb; color: #52606d; }
.alert.urgent { color: #ab091e; }
.alert.warning { color: #8d2b0b; }
"#;

/// Renderizar la página completa
pub fn render_fleet_page(fleet: &FleetResponse) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>RUC License Manager</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>RUC License Manager</h1>\n");

    let _ = writeln!(html, "<div class=\"status\">{}</div>", escape_html(&fleet.status_message));

    if let Some(banner) = &fleet.error_banner {
        let _ = writeln!(html, "<div class=\"banner\">{}</div>", escape_html(banner));
    }
    if let Some(host_error) = &fleet.host_error {
        let _ = writeln!(
            html,
            "<div class=\"banner\">Telematics unavailable: {}</div>",
            escape_html(host_error)
        );
    }

    render_summary(&mut html, fleet);
    render_alerts(&mut html, &fleet.alerts);
    render_table(&mut html, &fleet.vehicles);

    if let Some(updated) = fleet.last_updated {
        let _ = writeln!(html, "<p><small>Last updated {}</small></p>", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_summary(html: &mut String, fleet: &FleetResponse) {
    html.push_str("<div class=\"cards\">\n");
    for (label, value) in [
        ("Total Vehicles", fleet.summary.total),
        ("Active Licenses", fleet.summary.active),
        ("Renewal Alerts", fleet.summary.alerts),
        ("No Odometer Data", fleet.summary.no_data),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"card\"><div class=\"value\">{}</div><div>{}</div></div>",
            value, label
        );
    }
    html.push_str("</div>\n");
}

fn render_alerts(html: &mut String, alerts: &[RucAlert]) {
    html.push_str("<h2>Renewal Alerts</h2>\n");
    if alerts.is_empty() {
        html.push_str("<p>No vehicles need renewal.</p>\n");
        return;
    }

    html.push_str("<ul>\n");
    for alert in alerts {
        let (class, label) = match alert.urgency {
            Urgency::Urgent => ("urgent", "URGENT"),
            Urgency::Warning => ("warning", "WARNING"),
        };
        let _ = writeln!(
            html,
            "<li class=\"alert {}\"><strong>{}</strong> {}</li>",
            class,
            label,
            escape_html(&alert.message)
        );
    }
    html.push_str("</ul>\n");
}

fn render_table(html: &mut String, vehicles: &[VehicleRowDto]) {
    html.push_str("<h2>Fleet</h2>\n<table>\n<thead><tr>");
    for header in [
        "Vehicle",
        "Fleet #",
        "Reg Plate",
        "RUC Paid To",
        "Current Odometer",
        "Remaining",
        "Status",
        "Actions",
    ] {
        let _ = write!(html, "<th>{}</th>", header);
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in vehicles {
        let badge_class = match row.status.as_ref().map(|s| s.kind) {
            Some(StatusKind::Ok) => "ok",
            Some(StatusKind::Warning) => "warning",
            Some(StatusKind::Critical) => "critical",
            None => "nodata",
        };

        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            escape_html(&row.vehicle_description),
            escape_html(&row.fleet_number),
            escape_html(&row.reg_plate),
            escape_html(&row.ruc_paid_to_display),
            escape_html(&row.current_odometer_display),
            escape_html(&row.remaining_display),
        );
        let _ = write!(
            html,
            "<td><span class=\"badge {}\">{}</span></td><td>",
            badge_class,
            escape_html(&row.status_label)
        );

        let key = escape_html(&row.key);
        if row.can_refresh_odometer {
            let _ = write!(
                html,
                "<button data-action=\"odometer\" data-key=\"{}\">Get Reading</button> ",
                key
            );
        }
        if row.can_renew {
            let _ = write!(html, "<button data-action=\"renew\" data-key=\"{}\">Renew</button>", key);
        }
        html.push_str("</td></tr>\n");
    }

    if vehicles.is_empty() {
        html.push_str("<tr><td colspan=\"8\">No vehicles loaded</td></tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}
