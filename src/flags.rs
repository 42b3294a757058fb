use serde::{Deserialize, Serialize};

pub const FLAG_BUSINESS_TRIP: &str = "dr";
pub const FLAG_FIX_LOWER: &str = "lo";
pub const FLAG_FIX_UPPER: &str = "up";

/// Flag set parsed from the free-form, `+`-delimited flags cell of a day row.
///
/// Tokens are matched case-insensitively. Unrecognized tokens are kept for
/// diagnostics but never influence the computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayFlags {
    pub business_trip: bool,
    pub fix_lower: bool,
    pub fix_upper: bool,
    pub unknown: Vec<String>,
}

impl DayFlags {
    pub fn parse(input: &str) -> Self {
        let mut flags = Self::default();
        for token in input.to_lowercase().split('+').map(str::trim) {
            match token {
                FLAG_BUSINESS_TRIP => flags.business_trip = true,
                FLAG_FIX_LOWER => flags.fix_lower = true,
                FLAG_FIX_UPPER => flags.fix_upper = true,
                "" => {}
                other => flags.unknown.push(other.to_string()),
            }
        }
        flags
    }

    /// Both the start and the end of the day are pinned by explicit flags.
    pub fn is_fully_fixed(&self) -> bool {
        self.fix_lower && self.fix_upper
    }

    /// Three-character marker block for console reports: `d`/`l`/`u`, with
    /// `-` for absent flags.
    pub fn short_code(&self) -> String {
        let mut code = String::with_capacity(3);
        code.push(if self.business_trip { 'd' } else { '-' });
        code.push(if self.fix_lower { 'l' } else { '-' });
        code.push(if self.fix_upper { 'u' } else { '-' });
        code
    }

    /// Canonical `+`-delimited form for CSV export. Unknown tokens are
    /// preserved so a round trip does not lose information.
    pub fn to_flag_string(&self) -> String {
        let mut tokens: Vec<&str> = Vec::new();
        if self.business_trip {
            tokens.push(FLAG_BUSINESS_TRIP);
        }
        if self.fix_lower {
            tokens.push(FLAG_FIX_LOWER);
        }
        if self.fix_upper {
            tokens.push(FLAG_FIX_UPPER);
        }
        for token in &self.unknown {
            tokens.push(token);
        }
        tokens.join("+")
    }
}
