// Integration test harness for `vega-assists`.
//
// Keep integration tests as submodules of this harness (e.g. under `tests/suite/`) rather than
// adding new top-level `tests/*.rs` files, which would compile as additional test binaries and
// increase build/link time.
mod suite;
