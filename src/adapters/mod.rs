// Adapters layer: concrete implementations for external systems (files, spreadsheets, the player store).

pub mod spreadsheet;
pub mod storage;
pub mod supabase;
