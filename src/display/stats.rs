use std::time::SystemTime;

/// Terminal display statistics
#[derive(Debug, Clone, Default)]
pub struct DisplayStats {
    pub screens_drawn: u64,
    pub draw_errors: u64,
    pub gallery_refreshes: u64,
    pub last_draw_time: Option<SystemTime>,
}

impl DisplayStats {
    pub fn record_draw(&mut self) {
        self.screens_drawn += 1;
        self.last_draw_time = Some(SystemTime::now());
    }

    pub fn record_draw_error(&mut self) {
        self.draw_errors += 1;
        self.last_draw_time = Some(SystemTime::now());
    }

    pub fn record_gallery_refresh(&mut self) {
        self.gallery_refreshes += 1;
    }

    pub fn draw_success_rate(&self) -> f64 {
        let attempts = self.screens_drawn + self.draw_errors;
        if attempts == 0 {
            0.0
        } else {
            self.screens_drawn as f64 / attempts as f64
        }
    }
}
