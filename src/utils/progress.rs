use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner} {wide_msg}";
const COUNTER_TEMPLATE: &str = "{spinner} {msg:30} {wide_bar:} {pos:>3}/{len:3}";
const TICK: Duration = Duration::from_millis(100);

pub trait FetchProgress {
    fn add_spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar;
    fn add_counter(&self, len: u64, message: impl Into<Cow<'static, str>>) -> ProgressBar;
}

impl FetchProgress for MultiProgress {
    fn add_spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        let pb = self.add(ProgressBar::new_spinner());
        pb.set_style(style(SPINNER_TEMPLATE));
        pb.set_message(message);
        pb.enable_steady_tick(TICK);
        pb
    }

    fn add_counter(&self, len: u64, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        let pb = self.add(ProgressBar::new(len));
        pb.set_style(style(COUNTER_TEMPLATE).progress_chars("#>-"));
        pb.set_message(message);
        pb.enable_steady_tick(TICK);
        pb
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}
