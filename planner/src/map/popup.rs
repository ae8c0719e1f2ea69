//! HTML snippets bound to markers and controls.
//!
//! Everything taken from backend data goes through [`escape_html`].

use std::fmt::Write;

use chrono::NaiveDate;
use shared::{Container, PickupPoint};

use super::style::{StyleTier, ATTENTION_COLOR, NORMAL_COLOR, OUT_OF_SERVICE_COLOR, URGENT_COLOR};
use crate::{
    classify::{fill_percent, ContainerCondition, UrgencyClass},
    config::Depot,
    format::{kilometres, minutes},
};

pub const UNNAMED_POINT: &str = "Unnamed";
pub const URGENT_BADGE: &str = "ACTION REQUIRED - Urgent emptying";
pub const NORMAL_BADGE: &str = "Normal Status - OK";
pub const NO_CONTAINERS: &str = "No containers available";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn depot_popup(depot: &Depot) -> String {
    format!(
        "<b style=\"color:{NORMAL_COLOR}\">{}</b><br>Starting point",
        escape_html(&depot.name)
    )
}

/// Popup for a pickup point; the header carries `date`, the day it was drawn.
pub fn point_popup(point: &PickupPoint, class: UrgencyClass, date: NaiveDate) -> String {
    let name = if point.address.trim().is_empty() {
        UNNAMED_POINT
    } else {
        point.address.as_str()
    };

    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"pickup-popup\"><div class=\"pickup-header\"><div>Collection point</div><div>{}</div><div class=\"pickup-date\">{}</div></div>",
        escape_html(name),
        date.format("%A, %B %-d, %Y")
    );

    if point.containers.is_empty() {
        let _ = write!(html, "<div class=\"container-empty\">{NO_CONTAINERS}</div>");
    } else {
        for container in &point.containers {
            container_block(&mut html, container);
        }
    }

    let (badge, color) = match class {
        UrgencyClass::Urgent => (URGENT_BADGE, URGENT_COLOR),
        UrgencyClass::Normal => (NORMAL_BADGE, NORMAL_COLOR),
    };
    let _ = write!(
        html,
        "<div class=\"status-badge\" style=\"background:{color}\">{badge}</div></div>"
    );
    html
}

fn container_block(html: &mut String, container: &Container) {
    let condition = ContainerCondition::of(container);
    let color = match condition {
        ContainerCondition::OutOfService => OUT_OF_SERVICE_COLOR,
        ContainerCondition::Urgent => URGENT_COLOR,
        ContainerCondition::Attention => ATTENTION_COLOR,
        ContainerCondition::Normal => NORMAL_COLOR,
    };
    let id = container.id.as_deref().unwrap_or("N/A");

    let _ = write!(
        html,
        "<div class=\"container\" style=\"border:2px solid {color}\"><div>{}</div><div>ID: {}</div><span style=\"background:{color}\">{}</span>",
        escape_html(&container.kind),
        escape_html(id),
        condition.label()
    );
    if condition == ContainerCondition::OutOfService {
        html.push_str("<div>Container out of service</div><div>Requires intervention</div>");
    } else {
        let _ = write!(
            html,
            "<div>Fill level <b style=\"color:{color}\">{}%</b></div><div>{} / {} L</div>",
            fill_percent(container),
            container.fill_level,
            container.capacity
        );
    }
    html.push_str("</div>");
}

pub fn route_summary_popup(tier: StyleTier, stops: usize, distance_meters: f64, time_millis: u64) -> String {
    format!(
        "<div class=\"route-summary\"><div style=\"color:{color}\">{title}</div>\
         <div><b>{stops}</b> points</div><div><b>{km}</b> km</div><div><b>{min}</b> min</div></div>",
        color = tier.color(),
        title = tier.title(),
        km = kilometres(distance_meters),
        min = minutes(time_millis),
    )
}

pub fn legend_html() -> String {
    format!(
        "<div class=\"legend\"><div>Legend</div>\
         <div>Central depot</div>\
         <div style=\"color:{NORMAL_COLOR}\">Container OK</div>\
         <div style=\"color:{URGENT_COLOR}\">Urgent / out of service</div>\
         <div style=\"color:{}\">Optimized route</div></div>",
        StyleTier::Draft.color()
    )
}
