use crate::encoding::FixedCodec;
use crate::hasher::checksum;

pub const FILE_PREFIX: &str = "_cache";
pub const FILE_EXTENSION: &str = "bin";

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn sanitize(shape: &str) -> String {
    shape.chars().map(|c| if is_safe(c) { c } else { '-' }).collect()
}

// Tags with unsafe characters are replaced wholesale by their checksum; a
// partial replacement would let "a/b" and "a:b" share a file.
fn tag_component(tag: &str) -> String {
    if tag.chars().all(is_safe) {
        tag.to_string()
    } else {
        format!("x{:016x}", checksum(tag.as_bytes()))
    }
}

/// Cache file name for a key/value pair of types:
/// `_cache_<key shape>__<value shape>[_<tag>].bin`.
///
/// An empty tag is the same as no tag.
pub fn file_name<K: FixedCodec, V: FixedCodec>(tag: Option<&str>) -> String {
    let mut name = format!(
        "{}_{}__{}",
        FILE_PREFIX,
        sanitize(&K::shape()),
        sanitize(&V::shape())
    );
    if let Some(tag) = tag.filter(|t| !t.is_empty()) {
        name.push('_');
        name.push_str(&tag_component(tag));
    }
    name.push('.');
    name.push_str(FILE_EXTENSION);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Deps;

    type Key = Deps<(i32, f64)>;

    #[test]
    fn test_name_from_shapes() {
        assert_eq!(file_name::<Key, f64>(None), "_cache_i32_f64__f64.bin");
        assert_eq!(
            file_name::<Deps<(u8, [f32; 2])>, (u32, bool)>(None),
            "_cache_u8_f32x2__u32_bool.bin"
        );
    }

    #[test]
    fn test_name_is_deterministic() {
        assert_eq!(file_name::<Key, f64>(Some("t")), file_name::<Key, f64>(Some("t")));
    }

    #[test]
    fn test_shapes_and_tags_separate_files() {
        let base = file_name::<Key, f64>(None);
        assert_ne!(base, file_name::<Key, f32>(None));
        assert_ne!(base, file_name::<Deps<(i64, f64)>, f64>(None));
        assert_ne!(base, file_name::<Key, f64>(Some("a")));
        assert_ne!(
            file_name::<Key, f64>(Some("a")),
            file_name::<Key, f64>(Some("b"))
        );
        assert_eq!(base, file_name::<Key, f64>(Some("")));
    }

    #[test]
    fn test_unsafe_tags_are_hashed() {
        let slash = file_name::<Key, f64>(Some("a/b"));
        let colon = file_name::<Key, f64>(Some("a:b"));

        assert!(!slash.contains('/'));
        assert!(slash.starts_with("_cache_i32_f64__f64_x"));
        assert_ne!(slash, colon);
    }

    #[test]
    fn test_safe_tag_kept_verbatim() {
        assert_eq!(
            file_name::<Key, f64>(Some("run-2_b")),
            "_cache_i32_f64__f64_run-2_b.bin"
        );
    }
}
