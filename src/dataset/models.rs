//! Column names of the two input tables.

/// Columns of `matches.csv` (one row per match)
pub mod matches {
    pub const WINNER: &str = "winner";
    pub const WIN_BY_RUNS: &str = "win_by_runs";
    pub const WIN_BY_WICKETS: &str = "win_by_wickets";
    pub const TOSS_WINNER: &str = "toss_winner";
    /// "bat" | "field"
    pub const TOSS_DECISION: &str = "toss_decision";
    pub const SEASON: &str = "season";
    /// Third umpire, dropped during cleaning
    pub const UMPIRE3: &str = "umpire3";
}

/// Columns of `deliveries.csv` (one row per ball bowled)
pub mod deliveries {
    pub const BATSMAN: &str = "batsman";
    pub const BATSMAN_RUNS: &str = "batsman_runs";
    pub const BOWLER: &str = "bowler";
    /// Absent when no wicket fell on the ball
    pub const DISMISSAL_KIND: &str = "dismissal_kind";
}

/// Sentinel written into `winner` for matches without a result
pub const NO_RESULT: &str = "No Result";

/// Cell values treated as absent (in addition to the empty string).
pub const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell counts as an absent value
pub fn is_absent(raw: &str) -> bool {
    let v = raw.trim();
    v.is_empty() || NA_MARKERS.contains(&v)
}
