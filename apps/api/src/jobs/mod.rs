// Job lifecycle: submission, background generation, polling.
// Records live in the Job Store; every other component reaches it through
// `store::JobStore`.

pub mod dispatcher;
pub mod handlers;
pub mod lifecycle;
pub mod retriever;
pub mod worker;
