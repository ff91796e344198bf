mod error;
mod linked_list;

pub use error::{RangeBound, Result, SlistError};
pub use linked_list::{IntoIter, Iter, LinkedList};
