//! End-to-end HTTP tests for sparkyservice live under `tests/`.
