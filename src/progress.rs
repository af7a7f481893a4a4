use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ApiProgress {
    bar: ProgressBar,
}

impl ApiProgress {
    fn spinner(template: &str, message: String, tick: Duration) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(template)
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        bar.set_message(message);
        bar.enable_steady_tick(tick);

        Self { bar }
    }

    pub fn new_submit(job_id: &str) -> Self {
        Self::spinner(
            "🚀 {msg} {spinner:.green}",
            format!("Submitting job {job_id}..."),
            Duration::from_millis(80),
        )
    }

    pub fn new_polling(job_id: &str) -> Self {
        Self::spinner(
            "⏳ {msg} {spinner:.yellow}",
            format!("Waiting for job {job_id} to complete..."),
            Duration::from_millis(120),
        )
    }

    pub fn new_request(message: &str) -> Self {
        Self::spinner(
            "{spinner:.green} {msg}",
            message.to_owned(),
            Duration::from_millis(100),
        )
    }

    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
