/// Single-flight guard for article extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtractionState {
    #[default]
    Idle,
    Fetching { hn_id: String },
}

/// Returned when an extraction is requested while another is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Busy {
    pub pending_hn_id: String,
}

impl ExtractionState {
    pub fn begin(&mut self, hn_id: &str) -> Result<(), Busy> {
        match self {
            ExtractionState::Fetching { hn_id: pending } => Err(Busy {
                pending_hn_id: pending.clone(),
            }),
            ExtractionState::Idle => {
                *self = ExtractionState::Fetching {
                    hn_id: hn_id.to_string(),
                };
                Ok(())
            }
        }
    }

    pub fn finish(&mut self) {
        *self = ExtractionState::Idle;
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, ExtractionState::Fetching { .. })
    }

    pub fn pending(&self) -> Option<&str> {
        match self {
            ExtractionState::Fetching { hn_id } => Some(hn_id),
            ExtractionState::Idle => None,
        }
    }
}
