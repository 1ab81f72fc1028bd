//! Job extraction engine: drives a browser page to a company's job board and
//! turns the rendered job cards into [`JobRecord`](ycjobs_core::JobRecord)s.

mod error;
pub use error::{BrowserError, CardParseError};

pub mod board;
pub mod extract;
pub mod page;

pub use board::{JobBoard, parse_job_board};
pub use extract::extract_jobs;
pub use page::{BrowserLauncher, BrowserSession, JobPage};

#[cfg(feature = "chrome")]
mod chrome;
#[cfg(feature = "chrome")]
pub use chrome::{ChromeLauncher, ChromePage, ChromeSession};
