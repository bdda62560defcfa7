pub mod palette;
pub mod render;

pub use palette::Palette;
pub use render::{render_svg, render_to_file, ImageFormat};

use plotters::style::RGBColor;
use serde::Serialize;

use crate::stats::{Histogram, LabelCount, StatsReport, TossDecisionCount};

/// Dashboard tab a chart belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    TeamWins,
    TossAnalysis,
    PlayerStats,
    SeasonInsights,
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::TeamWins,
        Tab::TossAnalysis,
        Tab::PlayerStats,
        Tab::SeasonInsights,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::TeamWins => "Team Wins",
            Tab::TossAnalysis => "Toss Analysis",
            Tab::PlayerStats => "Player Stats",
            Tab::SeasonInsights => "Season Insights",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChartKind {
    Bar {
        bars: Vec<LabelCount>,
        palette: Palette,
    },
    Histogram {
        histogram: Histogram,
        color: RGBColor,
    },
    /// Count per x category, one bar per hue inside each category
    Grouped { groups: Vec<TossDecisionCount> },
}

/// A chart ready to render, independent of the output backend.
#[derive(Debug, Clone)]
pub struct Chart {
    /// File stem and DOM id
    pub id: &'static str,
    pub tab: Tab,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub rotate_x_labels: bool,
    pub size: (u32, u32),
    pub kind: ChartKind,
}

/// Build the chart list for every query the report computed, in display order.
pub fn charts_for(report: &StatsReport) -> Vec<Chart> {
    let mut charts = Vec::new();

    if let Some(wins) = &report.team_wins {
        charts.push(Chart {
            id: "team_wins",
            tab: Tab::TeamWins,
            title: "Most Matches Won by Teams",
            x_label: "Team",
            y_label: "Total Wins",
            rotate_x_labels: true,
            size: (1200, 600),
            kind: ChartKind::Bar {
                bars: wins.clone(),
                palette: Palette::Viridis,
            },
        });
    }
    if let Some(h) = &report.win_by_runs {
        charts.push(Chart {
            id: "win_by_runs",
            tab: Tab::TeamWins,
            title: "Distribution of Win by Runs",
            x_label: "Win by Runs",
            y_label: "Number of Matches",
            rotate_x_labels: false,
            size: (1000, 500),
            kind: ChartKind::Histogram {
                histogram: h.clone(),
                color: palette::ORANGE,
            },
        });
    }
    if let Some(h) = &report.win_by_wickets {
        charts.push(Chart {
            id: "win_by_wickets",
            tab: Tab::TeamWins,
            title: "Distribution of Win by Wickets",
            x_label: "Win by Wickets",
            y_label: "Number of Matches",
            rotate_x_labels: false,
            size: (1000, 500),
            kind: ChartKind::Histogram {
                histogram: h.clone(),
                color: palette::PURPLE,
            },
        });
    }
    if let Some(groups) = &report.toss_decisions {
        charts.push(Chart {
            id: "toss_decision",
            tab: Tab::TossAnalysis,
            title: "Toss Decision Trends",
            x_label: "Toss Decision",
            y_label: "count",
            rotate_x_labels: false,
            size: (800, 500),
            kind: ChartKind::Grouped {
                groups: groups.clone(),
            },
        });
    }
    if let Some(top) = &report.top_run_scorers {
        charts.push(Chart {
            id: "top_run_scorers",
            tab: Tab::PlayerStats,
            title: "Top 10 Run Scorers",
            x_label: "Batsman",
            y_label: "Total Runs",
            rotate_x_labels: true,
            size: (1000, 500),
            kind: ChartKind::Bar {
                bars: top.clone(),
                palette: Palette::Crest,
            },
        });
    }
    if let Some(top) = &report.top_wicket_takers {
        charts.push(Chart {
            id: "top_wicket_takers",
            tab: Tab::PlayerStats,
            title: "Top 10 Wicket Takers",
            x_label: "Bowler",
            y_label: "Wickets Taken",
            rotate_x_labels: true,
            size: (1000, 500),
            kind: ChartKind::Bar {
                bars: top.clone(),
                palette: Palette::Rocket,
            },
        });
    }
    if let Some(seasons) = &report.matches_per_season {
        charts.push(Chart {
            id: "matches_per_season",
            tab: Tab::SeasonInsights,
            title: "Matches Played Per Season",
            x_label: "Season",
            y_label: "Number of Matches",
            rotate_x_labels: false,
            size: (1000, 500),
            kind: ChartKind::Bar {
                bars: seasons.clone(),
                palette: Palette::Mako,
            },
        });
    }

    charts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Table};
    use crate::stats::MatchStatsEngine;

    fn report(matches: &str, deliveries: &str) -> StatsReport {
        let ds = Dataset::new(
            Table::from_reader(matches.as_bytes()).unwrap(),
            Table::from_reader(deliveries.as_bytes()).unwrap(),
        );
        MatchStatsEngine::new(ds).report().unwrap()
    }

    #[test]
    fn test_full_dataset_yields_every_chart_in_tab_order() {
        let r = report(
            "season,toss_winner,toss_decision,winner,win_by_runs,win_by_wickets\n\
             2008,A,bat,A,10,0\n2009,B,field,A,0,5\n",
            "batsman,batsman_runs,bowler,dismissal_kind\nX,4,Y,\nZ,1,Y,caught\n",
        );
        let ids: Vec<_> = charts_for(&r).iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec![
                "team_wins",
                "win_by_runs",
                "win_by_wickets",
                "toss_decision",
                "top_run_scorers",
                "top_wicket_takers",
                "matches_per_season",
            ]
        );
        let tabs: Vec<_> = charts_for(&r).iter().map(|c| c.tab).collect();
        assert!(tabs.windows(2).all(|w| {
            let pos = |t| Tab::ALL.iter().position(|x| *x == t).unwrap();
            pos(w[0]) <= pos(w[1])
        }));
    }

    #[test]
    fn test_skipped_queries_have_no_chart() {
        let r = report("winner\nA\n", "bowler\nY\n");
        let charts = charts_for(&r);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].id, "team_wins");
        match &charts[0].kind {
            ChartKind::Bar { bars, palette } => {
                assert_eq!(bars.len(), 1);
                assert_eq!(*palette, Palette::Viridis);
            }
            other => panic!("Expected Bar, got {:?}", other),
        }
    }
}
