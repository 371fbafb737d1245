// src/flags.rs

//! Decoding of event-attribute bitmasks into symbolic names.
//!
//! The vocabulary belongs to the notification facility, not to the
//! normalizer, so it is injected as a table. [`FlagCodec::fsevents`] is the
//! default and matches the FSEvents item flags; the `notify` backend builds
//! its bitmasks from the same constants in [`bits`].

/// FSEvents event-flag bits.
pub mod bits {
    pub const MUST_SCAN_SUB_DIRS: u32 = 0x0000_0001;
    pub const USER_DROPPED: u32 = 0x0000_0002;
    pub const KERNEL_DROPPED: u32 = 0x0000_0004;
    pub const EVENT_IDS_WRAPPED: u32 = 0x0000_0008;
    pub const HISTORY_DONE: u32 = 0x0000_0010;
    pub const ROOT_CHANGED: u32 = 0x0000_0020;
    pub const MOUNT: u32 = 0x0000_0040;
    pub const UNMOUNT: u32 = 0x0000_0080;
    pub const ITEM_CREATED: u32 = 0x0000_0100;
    pub const ITEM_REMOVED: u32 = 0x0000_0200;
    pub const ITEM_INODE_META_MOD: u32 = 0x0000_0400;
    pub const ITEM_RENAMED: u32 = 0x0000_0800;
    pub const ITEM_MODIFIED: u32 = 0x0000_1000;
    pub const ITEM_FINDER_INFO_MOD: u32 = 0x0000_2000;
    pub const ITEM_CHANGE_OWNER: u32 = 0x0000_4000;
    pub const ITEM_XATTR_MOD: u32 = 0x0000_8000;
    pub const ITEM_IS_FILE: u32 = 0x0001_0000;
    pub const ITEM_IS_DIR: u32 = 0x0002_0000;
    pub const ITEM_IS_SYMLINK: u32 = 0x0004_0000;
    pub const OWN_EVENT: u32 = 0x0008_0000;
    pub const ITEM_IS_HARDLINK: u32 = 0x0010_0000;
    pub const ITEM_IS_LAST_HARDLINK: u32 = 0x0020_0000;
    pub const ITEM_CLONED: u32 = 0x0040_0000;
}

/// Ordered `(bit, name)` pairs. Decoding emits names in this order.
pub type FlagTable = &'static [(u32, &'static str)];

pub static FSEVENTS_TABLE: FlagTable = &[
    (bits::MUST_SCAN_SUB_DIRS, "MustScanSubDirs"),
    (bits::USER_DROPPED, "UserDropped"),
    (bits::KERNEL_DROPPED, "KernelDropped"),
    (bits::EVENT_IDS_WRAPPED, "EventIdsWrapped"),
    (bits::HISTORY_DONE, "HistoryDone"),
    (bits::ROOT_CHANGED, "RootChanged"),
    (bits::MOUNT, "Mount"),
    (bits::UNMOUNT, "Unmount"),
    (bits::ITEM_CREATED, "ItemCreated"),
    (bits::ITEM_REMOVED, "ItemRemoved"),
    (bits::ITEM_INODE_META_MOD, "ItemInodeMetaMod"),
    (bits::ITEM_RENAMED, "ItemRenamed"),
    (bits::ITEM_MODIFIED, "ItemModified"),
    (bits::ITEM_FINDER_INFO_MOD, "ItemFinderInfoMod"),
    (bits::ITEM_CHANGE_OWNER, "ItemChangeOwner"),
    (bits::ITEM_XATTR_MOD, "ItemXattrMod"),
    (bits::ITEM_IS_FILE, "ItemIsFile"),
    (bits::ITEM_IS_DIR, "ItemIsDir"),
    (bits::ITEM_IS_SYMLINK, "ItemIsSymlink"),
    (bits::OWN_EVENT, "OwnEvent"),
    (bits::ITEM_IS_HARDLINK, "ItemIsHardlink"),
    (bits::ITEM_IS_LAST_HARDLINK, "ItemIsLastHardlink"),
    (bits::ITEM_CLONED, "ItemCloned"),
];

/// Pure bitmask → names decoder over an injected table.
#[derive(Debug, Clone, Copy)]
pub struct FlagCodec {
    table: FlagTable,
}

impl FlagCodec {
    pub const fn new(table: FlagTable) -> Self {
        Self { table }
    }

    pub const fn fsevents() -> Self {
        Self::new(FSEVENTS_TABLE)
    }

    pub fn table(&self) -> FlagTable {
        self.table
    }

    /// Names of every table entry whose bit is set in `mask`, in table order.
    ///
    /// Bits that have no table entry contribute nothing.
    pub fn decode(&self, mask: u32) -> Vec<&'static str> {
        self.table
            .iter()
            .filter(|&&(bit, _)| bit != 0 && mask & bit == bit)
            .map(|&(_, name)| name)
            .collect()
    }

    /// Bracketed, space-separated rendering, e.g. `[ItemCreated ItemIsFile]`.
    pub fn render(&self, mask: u32) -> String {
        format!("[{}]", self.decode(mask).join(" "))
    }
}

impl Default for FlagCodec {
    fn default() -> Self {
        Self::fsevents()
    }
}
