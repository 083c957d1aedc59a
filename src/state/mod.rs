//! Page lifecycle tracking
//!
//! A page is discovered, queued, fetched, and then lands in one terminal state.

mod page_state;

pub use page_state::PageState;
