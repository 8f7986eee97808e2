//! The translation record stored in each cache slot.

/// A virtual-to-physical page translation as produced by the (external)
/// page-table walker.
///
/// `lru_seq` is replacement-policy state that rides along with the entry
/// but is semantically owned by the physical slot, not the translation;
/// see [`crate::table::Slot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationEntry {
    pub vaddr: u64,
    pub asid: u16,
    pub log_bytes: u8,
    pub global: bool,
    pub lru_seq: u64,
}

impl TranslationEntry {
    pub fn new(vaddr: u64, asid: u16, log_bytes: u8, global: bool) -> Self {
        debug_assert!(crate::constants::is_supported_page_size(log_bytes));
        TranslationEntry {
            vaddr: page_base(vaddr, log_bytes),
            asid,
            log_bytes,
            global,
            lru_seq: 0,
        }
    }

    /// Size of the mapped region in bytes.
    pub fn size(&self) -> u64 {
        1u64 << self.log_bytes
    }
}

/// Clears the low `log_bytes` bits of `vaddr`, producing the page base.
pub fn page_base(vaddr: u64, log_bytes: u8) -> u64 {
    (vaddr >> log_bytes) << log_bytes
}
