use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
/// Produces human-like delays and typing behavior for form input.
pub struct BehavioralEngine {
    min_key_delay_ms: u64,
    max_key_delay_ms: u64,
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self {
            min_key_delay_ms: 30,
            max_key_delay_ms: 150,
        }
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        sleep(Duration::from_millis(Self::pick(min, max))).await;
    }

    /// Type the provided text with small random delays between characters.
    pub async fn type_text_human_like(&self, element: &Element, text: &str) -> Result<(), CmdError> {
        for ch in text.chars() {
            element.send_keys(&ch.to_string()).await?;
            self.random_delay(self.min_key_delay_ms, self.max_key_delay_ms)
                .await;
        }
        Ok(())
    }

    fn pick(min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        OsRng.gen_range(min..=max)
    }
}
