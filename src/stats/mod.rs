pub mod histogram;
pub mod ranking;

pub use histogram::{Histogram, DEFAULT_BINS};
pub use ranking::{LabelCount, Tally, TOP_N};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::models::{deliveries, matches};
use crate::dataset::{Dataset, Table};
use crate::error::StatsError;

/// The fixed catalogue of aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    TeamWinCounts,
    WinByRunsHistogram,
    WinByWicketsHistogram,
    TossImpactRatio,
    TossDecisionTrend,
    TopRunScorers,
    TopWicketTakers,
    MatchesPerSeason,
}

/// Which input table a query reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Matches,
    Deliveries,
}

impl Query {
    pub const ALL: [Query; 8] = [
        Query::TeamWinCounts,
        Query::WinByRunsHistogram,
        Query::WinByWicketsHistogram,
        Query::TossImpactRatio,
        Query::TossDecisionTrend,
        Query::TopRunScorers,
        Query::TopWicketTakers,
        Query::MatchesPerSeason,
    ];

    pub fn source(self) -> Source {
        match self {
            Query::TopRunScorers | Query::TopWicketTakers => Source::Deliveries,
            _ => Source::Matches,
        }
    }

    /// Columns that must exist for the query to run at all.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Query::TeamWinCounts => &[matches::WINNER],
            Query::WinByRunsHistogram => &[matches::WIN_BY_RUNS],
            Query::WinByWicketsHistogram => &[matches::WIN_BY_WICKETS],
            Query::TossImpactRatio => &[matches::TOSS_WINNER, matches::WINNER],
            Query::TossDecisionTrend => &[matches::TOSS_DECISION, matches::TOSS_WINNER],
            Query::TopRunScorers => &[deliveries::BATSMAN, deliveries::BATSMAN_RUNS],
            Query::TopWicketTakers => &[deliveries::BOWLER, deliveries::DISMISSAL_KIND],
            Query::MatchesPerSeason => &[matches::SEASON],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Query::TeamWinCounts => "team_win_counts",
            Query::WinByRunsHistogram => "win_by_runs_histogram",
            Query::WinByWicketsHistogram => "win_by_wickets_histogram",
            Query::TossImpactRatio => "toss_impact_ratio",
            Query::TossDecisionTrend => "toss_decision_trend",
            Query::TopRunScorers => "top_run_scorers",
            Query::TopWicketTakers => "top_wicket_takers",
            Query::MatchesPerSeason => "matches_per_season",
        }
    }
}

/// Count of matches for one (toss decision, toss winner) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TossDecisionCount {
    pub decision: String,
    pub team: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingColumns { columns: Vec<String> },
    NoRows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedQuery {
    pub query: Query,
    pub reason: SkipReason,
}

/// Every query's output for one dataset. `None` means the query was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub generated_at: DateTime<Utc>,
    pub match_rows: usize,
    pub delivery_rows: usize,
    pub match_columns: Vec<String>,
    pub delivery_columns: Vec<String>,
    pub team_wins: Option<Vec<LabelCount>>,
    pub win_by_runs: Option<Histogram>,
    pub win_by_wickets: Option<Histogram>,
    /// Percentage of matches won by the toss winner, 2 decimal places
    pub toss_impact_pct: Option<f64>,
    pub toss_decisions: Option<Vec<TossDecisionCount>>,
    pub top_run_scorers: Option<Vec<LabelCount>>,
    pub top_wicket_takers: Option<Vec<LabelCount>>,
    pub matches_per_season: Option<Vec<LabelCount>>,
    pub skipped: Vec<SkippedQuery>,
}

/// Read-only aggregate queries over a cleaned [`Dataset`].
///
/// Each query first checks its required columns; when any is missing the
/// query returns `None` instead of an error.
pub struct MatchStatsEngine {
    data: Dataset,
}

impl MatchStatsEngine {
    pub fn new(data: Dataset) -> Self {
        MatchStatsEngine { data }
    }

    fn table(&self, source: Source) -> &Table {
        match source {
            Source::Matches => &self.data.matches,
            Source::Deliveries => &self.data.deliveries,
        }
    }

    /// Required columns of `query` absent from its table
    pub fn missing_columns(&self, query: Query) -> Vec<String> {
        self.table(query.source())
            .missing_columns(query.required_columns())
    }

    fn applicable(&self, query: Query) -> bool {
        let ok = self.missing_columns(query).is_empty();
        if !ok {
            debug!("Query {} not applicable", query.name());
        }
        ok
    }

    // ── Match queries ─────────────────────────────────────────────────────────

    /// Wins per team, most wins first
    pub fn team_win_counts(&self) -> Option<Vec<LabelCount>> {
        if !self.applicable(Query::TeamWinCounts) {
            return None;
        }
        let mut tally = Tally::new();
        for winner in self.data.matches.column(matches::WINNER)?.flatten() {
            tally.add(winner, 1);
        }
        Some(tally.into_descending())
    }

    pub fn win_by_runs_histogram(&self) -> Result<Option<Histogram>, StatsError> {
        self.margin_histogram(Query::WinByRunsHistogram, matches::WIN_BY_RUNS)
    }

    pub fn win_by_wickets_histogram(&self) -> Result<Option<Histogram>, StatsError> {
        self.margin_histogram(Query::WinByWicketsHistogram, matches::WIN_BY_WICKETS)
    }

    fn margin_histogram(
        &self,
        query: Query,
        column: &str,
    ) -> Result<Option<Histogram>, StatsError> {
        if !self.applicable(query) {
            return Ok(None);
        }
        let Some(cells) = self.data.matches.column(column) else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(self.data.matches.len());
        for (row, cell) in cells.enumerate() {
            if let Some(raw) = cell {
                values.push(parse_count(column, row + 1, raw)? as f64);
            }
        }
        let hist = histogram::histogram(&values, DEFAULT_BINS);
        debug!(
            "{}: {} value(s) in {} bin(s)",
            column,
            hist.total(),
            hist.bins.len()
        );
        Ok(Some(hist))
    }

    /// Share of matches won by the toss winner, as a percentage rounded to 2 dp.
    /// `None` when the columns are missing or there are no matches.
    pub fn toss_impact_ratio(&self) -> Option<f64> {
        if !self.applicable(Query::TossImpactRatio) || self.data.matches.is_empty() {
            return None;
        }
        let toss = self.data.matches.column(matches::TOSS_WINNER)?;
        let winners = self.data.matches.column(matches::WINNER)?;
        let same = toss
            .zip(winners)
            .filter(|(t, w)| t.is_some() && t == w)
            .count();
        let pct = same as f64 / self.data.matches.len() as f64 * 100.0;
        Some(round2(pct))
    }

    /// Matches per (toss decision, toss winner); decisions and teams in first-seen order.
    pub fn toss_decision_trend(&self) -> Option<Vec<TossDecisionCount>> {
        if !self.applicable(Query::TossDecisionTrend) {
            return None;
        }
        let decisions = self.data.matches.column(matches::TOSS_DECISION)?;
        let teams = self.data.matches.column(matches::TOSS_WINNER)?;

        let mut groups: Vec<(&str, Tally)> = Vec::new();
        for (decision, team) in decisions.zip(teams) {
            let (Some(decision), Some(team)) = (decision, team) else {
                continue;
            };
            match groups.iter_mut().find(|(d, _)| *d == decision) {
                Some((_, tally)) => tally.add(team, 1),
                None => {
                    let mut tally = Tally::new();
                    tally.add(team, 1);
                    groups.push((decision, tally));
                }
            }
        }

        Some(
            groups
                .into_iter()
                .flat_map(|(decision, tally)| {
                    tally.into_entries().into_iter().map(move |e| TossDecisionCount {
                        decision: decision.to_string(),
                        team: e.label,
                        count: e.value,
                    })
                })
                .collect(),
        )
    }

    /// Matches per season, earliest season first
    pub fn matches_per_season(&self) -> Option<Vec<LabelCount>> {
        if !self.applicable(Query::MatchesPerSeason) {
            return None;
        }
        let mut tally = Tally::new();
        for season in self.data.matches.column(matches::SEASON)?.flatten() {
            tally.add(season, 1);
        }
        let mut seasons = tally.into_entries();
        seasons.sort_by(|a, b| ranking::season_order(&a.label, &b.label));
        Some(seasons)
    }

    // ── Delivery queries ──────────────────────────────────────────────────────

    /// Ten batsmen with the most runs; equal totals keep first-seen order.
    pub fn top_run_scorers(&self) -> Result<Option<Vec<LabelCount>>, StatsError> {
        if !self.applicable(Query::TopRunScorers) {
            return Ok(None);
        }
        let table = &self.data.deliveries;
        let (Some(batsmen), Some(runs)) = (
            table.column(deliveries::BATSMAN),
            table.column(deliveries::BATSMAN_RUNS),
        ) else {
            return Ok(None);
        };

        let mut tally = Tally::new();
        for (row, (batsman, runs)) in batsmen.zip(runs).enumerate() {
            let Some(batsman) = batsman else { continue };
            let runs = match runs {
                Some(raw) => parse_count(deliveries::BATSMAN_RUNS, row + 1, raw)?,
                None => 0,
            };
            tally.add(batsman, runs);
        }
        Ok(Some(tally.top(TOP_N)))
    }

    /// Ten bowlers credited with the most dismissals; equal counts keep first-seen order.
    pub fn top_wicket_takers(&self) -> Option<Vec<LabelCount>> {
        if !self.applicable(Query::TopWicketTakers) {
            return None;
        }
        let bowlers = self.data.deliveries.column(deliveries::BOWLER)?;
        let dismissals = self.data.deliveries.column(deliveries::DISMISSAL_KIND)?;

        let mut tally = Tally::new();
        for (bowler, dismissal) in bowlers.zip(dismissals) {
            if let (Some(bowler), Some(_)) = (bowler, dismissal) {
                tally.add(bowler, 1);
            }
        }
        Some(tally.top(TOP_N))
    }

    // ── Report ────────────────────────────────────────────────────────────────

    /// Run every query in catalogue order.
    pub fn report(&self) -> Result<StatsReport, StatsError> {
        let mut skipped = Vec::new();
        for query in Query::ALL {
            let missing = self.missing_columns(query);
            if !missing.is_empty() {
                info!(
                    "Skipping {}: column(s) {:?} not found in {}",
                    query.name(),
                    missing,
                    match query.source() {
                        Source::Matches => "matches.csv",
                        Source::Deliveries => "deliveries.csv",
                    }
                );
                skipped.push(SkippedQuery {
                    query,
                    reason: SkipReason::MissingColumns { columns: missing },
                });
            }
        }

        let toss_impact_pct = self.toss_impact_ratio();
        if toss_impact_pct.is_none() && self.applicable(Query::TossImpactRatio) {
            info!("Skipping {}: no matches", Query::TossImpactRatio.name());
            skipped.push(SkippedQuery {
                query: Query::TossImpactRatio,
                reason: SkipReason::NoRows,
            });
        }

        let report = StatsReport {
            generated_at: Utc::now(),
            match_rows: self.data.matches.len(),
            delivery_rows: self.data.deliveries.len(),
            match_columns: self.data.matches.headers().to_vec(),
            delivery_columns: self.data.deliveries.headers().to_vec(),
            team_wins: self.team_win_counts(),
            win_by_runs: self.win_by_runs_histogram()?,
            win_by_wickets: self.win_by_wickets_histogram()?,
            toss_impact_pct,
            toss_decisions: self.toss_decision_trend(),
            top_run_scorers: self.top_run_scorers()?,
            top_wicket_takers: self.top_wicket_takers(),
            matches_per_season: self.matches_per_season(),
            skipped,
        };
        info!(
            "Report ready: {} match rows, {} delivery rows, {} quer(ies) skipped",
            report.match_rows,
            report.delivery_rows,
            report.skipped.len()
        );
        Ok(report)
    }
}

/// Parse a non-negative integer cell; `4.0` style floats are accepted.
fn parse_count(column: &str, row: usize, raw: &str) -> Result<u64, StatsError> {
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(StatsError::InvalidNumber {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        }),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine(matches_csv: &str, deliveries_csv: &str) -> MatchStatsEngine {
        let ds = Dataset::new(
            Table::from_reader(matches_csv.as_bytes()).unwrap(),
            Table::from_reader(deliveries_csv.as_bytes()).unwrap(),
        );
        MatchStatsEngine::new(ds)
    }

    fn matches_only(matches_csv: &str) -> MatchStatsEngine {
        engine(matches_csv, "batsman,batsman_runs,bowler,dismissal_kind\n")
    }

    const MATCHES: &str = "\
id,season,team1,team2,toss_winner,toss_decision,result,winner,win_by_runs,win_by_wickets,umpire3
1,2017,SRH,RCB,RCB,field,normal,SRH,35,0,
2,2017,MI,RPS,RPS,field,normal,RPS,0,7,
3,2008,KKR,RCB,RCB,bat,normal,KKR,140,0,
4,2008,CSK,KXIP,CSK,bat,no result,,0,0,Someone
5,2009,MI,CSK,MI,bat,normal,MI,19,0,
";

    const DELIVERIES: &str = "\
match_id,inning,batsman,bowler,batsman_runs,dismissal_kind
1,1,Warner,Chahal,4,
1,1,Warner,Chahal,6,
1,1,Dhawan,Chahal,1,caught
1,2,Kohli,Rashid,4,
1,2,Kohli,Rashid,0,bowled
1,2,Gayle,Bhuvi,6,
1,2,Gayle,Bhuvi,0,lbw
2,1,Rahane,Bhuvi,2,
";

    #[test]
    fn test_team_win_counts_sample_matches() {
        let e = matches_only("winner\nTeamA\nTeamA\nTeamB\n");
        assert_eq!(
            e.team_win_counts().unwrap(),
            vec![LabelCount::new("TeamA", 2), LabelCount::new("TeamB", 1)]
        );
    }

    #[test]
    fn test_team_win_counts_sum_to_rows_with_no_result_sentinel() {
        let e = engine(MATCHES, DELIVERIES);
        let wins = e.team_win_counts().unwrap();
        assert_eq!(wins.iter().map(|w| w.value).sum::<u64>(), 5);
        assert!(wins.iter().any(|w| w.label == "No Result" && w.value == 1));
    }

    #[test]
    fn test_toss_impact_one_in_three() {
        let e = matches_only("toss_winner,winner\nA,A\nB,C\nA,B\n");
        assert_relative_eq!(e.toss_impact_ratio().unwrap(), 33.33);
    }

    #[test]
    fn test_toss_impact_bounds() {
        let all = matches_only("toss_winner,winner\nA,A\nB,B\n");
        assert_relative_eq!(all.toss_impact_ratio().unwrap(), 100.0);
        let none = matches_only("toss_winner,winner\nA,B\nB,A\n");
        assert_relative_eq!(none.toss_impact_ratio().unwrap(), 0.0);
    }

    #[test]
    fn test_toss_impact_absent_toss_winner_never_matches() {
        // Absent winners become "No Result"; an absent toss winner must not count
        let e = matches_only("toss_winner,winner\n,\nA,A\n");
        assert_relative_eq!(e.toss_impact_ratio().unwrap(), 50.0);
    }

    #[test]
    fn test_toss_impact_empty_table() {
        let e = matches_only("toss_winner,winner\n");
        assert!(e.toss_impact_ratio().is_none());
        let report = e.report().unwrap();
        assert!(report.skipped.contains(&SkippedQuery {
            query: Query::TossImpactRatio,
            reason: SkipReason::NoRows,
        }));
    }

    #[test]
    fn test_toss_decision_trend_groups_pairs() {
        let e = engine(MATCHES, DELIVERIES);
        let trend = e.toss_decision_trend().unwrap();
        let as_tuples: Vec<_> = trend
            .iter()
            .map(|t| (t.decision.as_str(), t.team.as_str(), t.count))
            .collect();
        assert_eq!(
            as_tuples,
            vec![
                ("field", "RCB", 1),
                ("field", "RPS", 1),
                ("bat", "RCB", 1),
                ("bat", "CSK", 1),
                ("bat", "MI", 1),
            ]
        );
        assert_eq!(trend.iter().map(|t| t.count).sum::<u64>(), 5);
    }

    #[test]
    fn test_histograms() {
        let e = engine(MATCHES, DELIVERIES);
        let runs = e.win_by_runs_histogram().unwrap().unwrap();
        assert_eq!(runs.bins.len(), DEFAULT_BINS);
        assert_eq!(runs.total(), 5);
        let (lo, hi) = runs.range().unwrap();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 140.0);

        let wickets = e.win_by_wickets_histogram().unwrap().unwrap();
        assert_eq!(wickets.total(), 5);
    }

    #[test]
    fn test_histogram_skips_absent_and_rejects_garbage() {
        let e = matches_only("win_by_runs\n10\n\n20.0\n");
        assert_eq!(e.win_by_runs_histogram().unwrap().unwrap().total(), 2);

        let bad = matches_only("win_by_runs\n10\nlots\n");
        match bad.win_by_runs_histogram() {
            Err(StatsError::InvalidNumber { column, row, value }) => {
                assert_eq!(column, "win_by_runs");
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_top_run_scorers() {
        let e = engine(MATCHES, DELIVERIES);
        let top = e.top_run_scorers().unwrap().unwrap();
        assert_eq!(
            top,
            vec![
                LabelCount::new("Warner", 10),
                LabelCount::new("Gayle", 6),
                LabelCount::new("Kohli", 4),
                LabelCount::new("Rahane", 2),
                LabelCount::new("Dhawan", 1),
            ]
        );
    }

    #[test]
    fn test_top_run_scorers_ties_keep_first_seen_order() {
        let e = engine(
            "winner\nA\n",
            "batsman,batsman_runs\nB,4\nA,4\nC,2\nA,0\n",
        );
        let labels: Vec<_> = e
            .top_run_scorers()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|l| l.label)
            .collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_top_run_scorers_capped_at_ten() {
        let mut csv = String::from("batsman,batsman_runs\n");
        for i in 0..15 {
            csv.push_str(&format!("p{i},{}\n", i % 4));
        }
        let e = engine("winner\nA\n", &csv);
        let top = e.top_run_scorers().unwrap().unwrap();
        assert_eq!(top.len(), TOP_N);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_top_wicket_takers_counts_only_dismissals() {
        let e = engine(MATCHES, DELIVERIES);
        let top = e.top_wicket_takers().unwrap();
        assert_eq!(
            top,
            vec![
                LabelCount::new("Chahal", 1),
                LabelCount::new("Rashid", 1),
                LabelCount::new("Bhuvi", 1),
            ]
        );
    }

    #[test]
    fn test_matches_per_season_sorted_ascending() {
        let e = engine(MATCHES, DELIVERIES);
        assert_eq!(
            e.matches_per_season().unwrap(),
            vec![
                LabelCount::new("2008", 2),
                LabelCount::new("2009", 1),
                LabelCount::new("2017", 2),
            ]
        );
    }

    #[test]
    fn test_missing_columns_skip_queries() {
        let e = engine("id,winner\n1,A\n", "match_id,batter,bowler\n1,X,Y\n");
        assert!(e.win_by_runs_histogram().unwrap().is_none());
        assert!(e.win_by_wickets_histogram().unwrap().is_none());
        assert!(e.toss_impact_ratio().is_none());
        assert!(e.toss_decision_trend().is_none());
        assert!(e.top_run_scorers().unwrap().is_none());
        assert!(e.top_wicket_takers().is_none());
        assert!(e.matches_per_season().is_none());
        assert!(e.team_win_counts().is_some());

        let report = e.report().unwrap();
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.query).collect();
        assert_eq!(
            skipped,
            vec![
                Query::WinByRunsHistogram,
                Query::WinByWicketsHistogram,
                Query::TossImpactRatio,
                Query::TossDecisionTrend,
                Query::TopRunScorers,
                Query::TopWicketTakers,
                Query::MatchesPerSeason,
            ]
        );
        assert_eq!(
            report.skipped[4].reason,
            SkipReason::MissingColumns {
                columns: vec!["batsman".into(), "batsman_runs".into()]
            }
        );
    }

    #[test]
    fn test_umpire3_removal_does_not_change_results() {
        let without: String = MATCHES
            .lines()
            .map(|l| l.rsplit_once(',').map(|(head, _)| head).unwrap_or(l))
            .collect::<Vec<_>>()
            .join("\n");
        let a = engine(MATCHES, DELIVERIES).report().unwrap();
        let b = engine(&without, DELIVERIES).report().unwrap();
        assert_eq!(a.team_wins, b.team_wins);
        assert_eq!(a.win_by_runs, b.win_by_runs);
        assert_eq!(a.win_by_wickets, b.win_by_wickets);
        assert_eq!(a.toss_impact_pct, b.toss_impact_pct);
        assert_eq!(a.toss_decisions, b.toss_decisions);
        assert_eq!(a.matches_per_season, b.matches_per_season);
        assert_eq!(a.match_columns, b.match_columns);
    }

    #[test]
    fn test_report_serializes_query_names() {
        let e = engine("winner\nA\n", "batsman\nX\n");
        let json = serde_json::to_value(e.report().unwrap()).unwrap();
        assert_eq!(json["skipped"][0]["query"], "win_by_runs_histogram");
        assert_eq!(json["skipped"][0]["reason"]["kind"], "missing_columns");
        assert_eq!(json["team_wins"][0]["label"], "A");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("c", 1, "7").unwrap(), 7);
        assert_eq!(parse_count("c", 1, "7.0").unwrap(), 7);
        assert!(parse_count("c", 1, "-1").is_err());
        assert!(parse_count("c", 1, "1.5").is_err());
        assert!(parse_count("c", 1, "inf").is_err());
    }
}
