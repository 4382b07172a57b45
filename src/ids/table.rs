//! Compiled-in identifier pairs.
//!
//! Each entry is `(canonical, legacy)`. Canonical ids are storage-assigned
//! UUIDs; legacy ids are the human-readable demo slugs that still carry the
//! richer presentation datasets.

pub(super) const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("8179401a-d2c5-4561-98ae-2010b561d477", "yakoyo-demo"),
    ("2c6e0f91-7b3a-4d58-a1e4-5f08c9d2b736", "noodle-bar-demo"),
    ("a41d7e2b-90c6-4f1a-8b35-e6c2d07f9a18", "taqueria-demo"),
    ("d95b3c60-1e84-47f2-b9a7-3c0e6f15d842", "bistro-demo"),
];
