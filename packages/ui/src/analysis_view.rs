use dioxus::prelude::*;
use store::text::analysis_points;

/// The analyzer's reflection for one entry.
#[component]
pub fn AnalysisView(
    analysis: Option<String>,
    #[props(default)] analyzing: bool,
    /// Show the "智者洞察" heading above the points.
    #[props(default)]
    with_heading: bool,
) -> Element {
    let body = if analyzing {
        rsx! {
            p {
                class: "analysis-status",
                span { class: "spin", "⚡" }
                "AI 正在分析..."
            }
        }
    } else {
        match analysis.as_deref().map(analysis_points) {
            Some(points) if !points.is_empty() => rsx! {
                ul {
                    class: "analysis-points",
                    for (i, point) in points.into_iter().enumerate() {
                        li {
                            key: "{i}",
                            if let Some(label) = &point.label {
                                span { class: "analysis-label", "{label}：" }
                            }
                            "{point.body}"
                        }
                    }
                }
            },
            _ => rsx! {
                p { class: "analysis-status", "等待 AI 分析..." }
            },
        }
    };

    rsx! {
        div {
            class: "analysis",
            if with_heading {
                h3 { class: "analysis-heading", "智者洞察" }
            }
            {body}
        }
    }
}
