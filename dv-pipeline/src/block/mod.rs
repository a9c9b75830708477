//! Fixed-capacity sample block arena.
//!
//! Blocks are allocated once at construction and live as long as the pool;
//! only ownership of a block's *current contents* moves around, carried by
//! an exclusive [`Block`] handle. Handles travel through the ring queues
//! between the front end and the pipeline driver, so each block is written
//! by exactly one side at a time.

mod handle;
mod pool;

pub use handle::Block;
pub use pool::BlockPool;
