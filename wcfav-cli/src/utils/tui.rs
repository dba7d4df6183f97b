use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", ""])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Writer that hides the spinner while a line is printed, so report output
/// and the spinner don't garble each other.
pub struct SpinnerAware<'a, W: Write> {
    spinner: &'a ProgressBar,
    inner: W,
}

impl<'a, W: Write> SpinnerAware<'a, W> {
    pub fn new(spinner: &'a ProgressBar, inner: W) -> Self {
        SpinnerAware { spinner, inner }
    }
}

impl<W: Write> Write for SpinnerAware<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.spinner.suspend(|| inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
