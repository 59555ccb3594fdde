//! UCI info line types.

/// Score in centipawns or mate distance.
///
/// Always relative to the side to move in the searched position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated).
    Mate(i32),
}

/// Whether a reported score is exact or only a search bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreBound {
    #[default]
    Exact,
    Lower,
    Upper,
}

/// Search information from engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// 1-based index of the line this info belongs to.
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Bound qualifier of `score`.
    pub bound: ScoreBound,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
}

impl EngineInfo {
    /// Create a new empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Line index this info belongs to, treating a missing `multipv` as line 1.
    pub fn line(&self) -> u32 {
        self.multipv.unwrap_or(1)
    }

    /// Parse UCI info line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        if parts.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        let parts: Vec<&str> = parts.collect();
        let mut i = 0;

        while i < parts.len() {
            match parts[i] {
                "depth" => {
                    i += 1;
                    if i < parts.len() {
                        info.depth = parts[i].parse().ok();
                    }
                }
                "multipv" => {
                    i += 1;
                    if i < parts.len() {
                        info.multipv = parts[i].parse().ok();
                    }
                }
                "score" => {
                    i += 1;
                    if i + 1 < parts.len() {
                        let value = parts[i + 1].parse().ok();
                        info.score = match (parts[i], value) {
                            ("cp", Some(cp)) => Some(Score::Cp(cp)),
                            ("mate", Some(m)) => Some(Score::Mate(m)),
                            _ => info.score,
                        };
                        i += 1;
                    }
                }
                "lowerbound" => info.bound = ScoreBound::Lower,
                "upperbound" => info.bound = ScoreBound::Upper,
                "nodes" => {
                    i += 1;
                    if i < parts.len() {
                        info.nodes = parts[i].parse().ok();
                    }
                }
                "pv" => {
                    i += 1;
                    while i < parts.len() && !is_info_keyword(parts[i]) {
                        info.pv.push(parts[i].to_string());
                        i += 1;
                    }
                    continue;
                }
                // Free text to the end of the line.
                "string" => break,
                _ => {}
            }
            i += 1;
        }

        Some(info)
    }
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "cpuload"
            | "refutation"
            | "currline"
            | "string"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_info() {
        let line = "info depth 12 score cp 30 nodes 125000 nps 500000 pv e2e4 e7e5 g1f3";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.depth, Some(12));
        assert_eq!(info.score, Some(Score::Cp(30)));
        assert_eq!(info.bound, ScoreBound::Exact);
        assert_eq!(info.nodes, Some(125000));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(info.line(), 1);
    }

    #[test]
    fn parse_mate_score() {
        let line = "info depth 20 score mate -3 pv e2e4";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.score, Some(Score::Mate(-3)));
    }

    #[test]
    fn parse_multipv_and_bound() {
        let line = "info depth 18 seldepth 24 multipv 2 score cp -41 upperbound nodes 9000 pv d2d4 d7d5";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.line(), 2);
        assert_eq!(info.depth, Some(18));
        assert_eq!(info.score, Some(Score::Cp(-41)));
        assert_eq!(info.bound, ScoreBound::Upper);
        assert_eq!(info.pv, vec!["d2d4", "d7d5"]);
    }

    #[test]
    fn pv_stops_at_next_keyword() {
        let line = "info depth 5 pv e2e4 e7e5 nodes 1000";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.nodes, Some(1000));
    }

    #[test]
    fn string_info_is_not_read_as_fields() {
        let info = EngineInfo::parse("info string depth 9 score cp 50 pv e2e4").unwrap();
        assert!(info.depth.is_none());
        assert!(info.score.is_none());
        assert!(info.pv.is_empty());
    }

    #[test]
    fn missing_score_value_leaves_score_unset() {
        let info = EngineInfo::parse("info depth 3 score cp").unwrap();
        assert_eq!(info.depth, Some(3));
        assert!(info.score.is_none());
    }

    #[test]
    fn non_info_lines_are_rejected() {
        assert!(EngineInfo::parse("bestmove e2e4").is_none());
        assert!(EngineInfo::parse("information").is_none());
    }
}
