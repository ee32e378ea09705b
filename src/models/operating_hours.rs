use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Weekly business hours, one record per weekday (0 = Monday .. 6 = Sunday),
/// with an optional single break window subtracted from availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingHours {
    pub weekday: u8,
    pub is_closed: bool,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

impl OperatingHours {
    pub fn closed(weekday: u8) -> Self {
        Self {
            weekday,
            is_closed: true,
            open_time: None,
            close_time: None,
            break_start: None,
            break_end: None,
        }
    }

    /// Invariants: closed days carry no time fields; open days need
    /// open < close; a break must be a proper interval inside [open, close].
    pub fn validate(&self) -> Result<(), String> {
        if self.weekday > 6 {
            return Err(format!("invalid weekday: {}", self.weekday));
        }

        if self.is_closed {
            if self.open_time.is_some()
                || self.close_time.is_some()
                || self.break_start.is_some()
                || self.break_end.is_some()
            {
                return Err("a closed day must not have any time fields".to_string());
            }
            return Ok(());
        }

        let (open, close) = match (self.open_time, self.close_time) {
            (Some(o), Some(c)) => (o, c),
            _ => return Err("an open day requires open_time and close_time".to_string()),
        };
        if open >= close {
            return Err("open_time must be before close_time".to_string());
        }

        match (self.break_start, self.break_end) {
            (None, None) => Ok(()),
            (Some(bs), Some(be)) => {
                if bs >= be {
                    return Err("break_start must be before break_end".to_string());
                }
                if bs < open || be > close {
                    return Err("break must lie within operating hours".to_string());
                }
                Ok(())
            }
            _ => Err("break_start and break_end must be set together".to_string()),
        }
    }
}
