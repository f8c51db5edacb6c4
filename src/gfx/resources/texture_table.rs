//! Texture indexing shared by every material of a scene
//!
//! Indices 0, 1 and 2 always hold the default textures. Texture files get the
//! following indices in first-seen order: materials are scanned in table order
//! and, within a material, slots in descriptor order. Two references resolve to
//! the same index when their normalized paths are equal.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

/// Reserved index of the opaque white texture
pub const WHITE_TEXTURE: usize = 0;
/// Reserved index of the opaque black texture
pub const BLACK_TEXTURE: usize = 1;
/// Reserved index of the flat normal-map texture
pub const FLAT_NORMAL_TEXTURE: usize = 2;
/// First index handed out to texture files
pub const FIRST_FILE_TEXTURE: usize = 3;

pub const TEXTURE_SLOT_COUNT: usize = 5;

/// Descriptor slots of a material, in binding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureSlot {
    Ambient = 0,
    Diffuse = 1,
    Specular = 2,
    Emissive = 3,
    Normal = 4,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; TEXTURE_SLOT_COUNT] = [
        TextureSlot::Ambient,
        TextureSlot::Diffuse,
        TextureSlot::Specular,
        TextureSlot::Emissive,
        TextureSlot::Normal,
    ];

    /// Texture used when a material leaves this slot empty
    pub fn default_texture_index(self) -> usize {
        match self {
            TextureSlot::Ambient | TextureSlot::Emissive => BLACK_TEXTURE,
            TextureSlot::Diffuse | TextureSlot::Specular => WHITE_TEXTURE,
            TextureSlot::Normal => FLAT_NORMAL_TEXTURE,
        }
    }

    /// Normal maps hold vectors, every other slot holds colour
    pub fn is_color(self) -> bool {
        self != TextureSlot::Normal
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Lexically normalizes a texture reference
///
/// Backslashes count as separators, `.` components are dropped and `..`
/// removes the preceding normal component. The filesystem is never touched.
pub fn normalize_texture_path(path: &Path) -> PathBuf {
    let unified = path.to_string_lossy().replace('\\', "/");
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(&unified).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    normalized.pop();
                    depth -= 1;
                } else {
                    normalized.push("..");
                }
            }
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Path-to-index assignment of every texture file a scene references
#[derive(Debug, Default, Clone)]
pub struct TextureTable {
    files: Vec<PathBuf>,
    indices: HashMap<PathBuf, usize>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans material slot maps in order and assigns indices to unseen paths
    pub fn scan<'a, I>(slot_maps: I) -> Self
    where
        I: IntoIterator<Item = &'a BTreeMap<TextureSlot, PathBuf>>,
    {
        let mut table = Self::new();
        for slots in slot_maps {
            // BTreeMap iterates in slot order
            for path in slots.values() {
                table.insert(path);
            }
        }
        table
    }

    /// Returns the index of `path`, assigning the next free one if it is new
    pub fn insert(&mut self, path: &Path) -> usize {
        let normalized = normalize_texture_path(path);
        if let Some(&index) = self.indices.get(&normalized) {
            return index;
        }
        let index = FIRST_FILE_TEXTURE + self.files.len();
        self.indices.insert(normalized.clone(), index);
        self.files.push(normalized);
        index
    }

    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.indices.get(&normalize_texture_path(path)).copied()
    }

    /// Texture index for `slot` given the references of one material
    pub fn resolve(&self, slots: &BTreeMap<TextureSlot, PathBuf>, slot: TextureSlot) -> usize {
        slots
            .get(&slot)
            .and_then(|path| self.index_of(path))
            .unwrap_or_else(|| slot.default_texture_index())
    }

    /// All five indices of a material in slot order
    pub fn resolve_all(&self, slots: &BTreeMap<TextureSlot, PathBuf>) -> [usize; TEXTURE_SLOT_COUNT] {
        TextureSlot::ALL.map(|slot| self.resolve(slots, slot))
    }

    /// Normalized file paths, the `n`th belonging to index `FIRST_FILE_TEXTURE + n`
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Total number of textures including the three defaults
    pub fn texture_count(&self) -> usize {
        FIRST_FILE_TEXTURE + self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(entries: &[(TextureSlot, &str)]) -> BTreeMap<TextureSlot, PathBuf> {
        entries
            .iter()
            .map(|(slot, path)| (*slot, PathBuf::from(path)))
            .collect()
    }

    #[test]
    fn test_normalize_texture_path() {
        assert_eq!(normalize_texture_path(Path::new("./textures/a.png")), PathBuf::from("textures/a.png"));
        assert_eq!(normalize_texture_path(Path::new("textures\\a.png")), PathBuf::from("textures/a.png"));
        assert_eq!(normalize_texture_path(Path::new("textures/sub/../a.png")), PathBuf::from("textures/a.png"));
        assert_eq!(normalize_texture_path(Path::new("../shared/a.png")), PathBuf::from("../shared/a.png"));
    }

    #[test]
    fn test_default_slot_resolution() {
        let table = TextureTable::new();
        let empty = BTreeMap::new();
        assert_eq!(
            table.resolve_all(&empty),
            [BLACK_TEXTURE, WHITE_TEXTURE, WHITE_TEXTURE, BLACK_TEXTURE, FLAT_NORMAL_TEXTURE]
        );
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let materials = vec![
            slots(&[(TextureSlot::Normal, "n.png"), (TextureSlot::Diffuse, "d.png")]),
            slots(&[(TextureSlot::Diffuse, "./d.png"), (TextureSlot::Specular, "s.png")]),
        ];
        let table = TextureTable::scan(&materials);

        // diffuse comes before normal within the first material
        assert_eq!(table.index_of(Path::new("d.png")), Some(3));
        assert_eq!(table.index_of(Path::new("n.png")), Some(4));
        assert_eq!(table.index_of(Path::new("s.png")), Some(5));
        assert_eq!(table.texture_count(), 6);
        assert_eq!(table.resolve(&materials[1], TextureSlot::Diffuse), 3);
    }
}
