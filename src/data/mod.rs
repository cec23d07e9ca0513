// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between decoded samples in host memory and
// device-resident tensor batches. Decoding image files and
// augmentation happen upstream; this layer starts from
// MattingSample values.
//
//   MattingSample / MattingDataset → implements Burn's Dataset
//       │
//       ▼
//   split_dataset                  → ShuffledDataset + PartialDataset
//       │                            train / validation halves
//       ▼
//   MattingBatcher                 → Burn Batcher: samples → tensors
//       │
//       ▼
//   MattingLoader                  → BatchSource over a Burn DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// MattingBatch and the BatchSource trait consumed by the trainer
pub mod batch;

/// Host-side samples and Burn's Dataset implementation
pub mod dataset;

/// Stacks samples into device tensors
pub mod batcher;

/// BatchSource over Burn's DataLoader, train/validation loaders
pub mod loader;

/// Seeded train/validation dataset split
pub mod splitter;
