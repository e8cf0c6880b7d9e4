//! Cross-module swap scenarios driven through `BridgeOrchestrator`.

mod concurrency;
mod flows;
mod persistence;
