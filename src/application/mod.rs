// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers to turn one dataset config into
// k fold rotations on disk.
//
// Rules for this layer:
//   - No parsing, label or split logic here (Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Single-dataset and batch preparation workflows
pub mod prepare_use_case;
