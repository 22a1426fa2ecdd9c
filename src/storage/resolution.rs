//! Canonical resolution labels used as benchmark group keys

pub const FHD: &str = "1920x1080";
pub const WQHD: &str = "2560x1440";
pub const UHD: &str = "3840x2160";

/// Canonical labels, lowest first.
pub const CANONICAL_RESOLUTIONS: [&str; 3] = [FHD, WQHD, UHD];

/// Map aliases (`FHD`, `1440p`, `4K`, `1920 x 1080`, ...) to a canonical label.
/// Anything unrecognized is returned trimmed but otherwise unchanged.
pub fn normalize_resolution(label: &str) -> String {
    let trimmed = label.trim();
    let key: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '×' | 'X' => 'x',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    let canonical = match key.as_str() {
        "fhd" | "1080p" | "1920x1080" => Some(FHD),
        "wqhd" | "qhd" | "1440p" | "2560x1440" => Some(WQHD),
        "uhd" | "4k" | "2160p" | "3840x2160" => Some(UHD),
        _ => None,
    };

    canonical.map_or_else(|| trimmed.to_string(), str::to_string)
}

/// Short display name for a canonical label.
pub fn short_label(resolution: &str) -> &str {
    match resolution {
        FHD => "FHD",
        WQHD => "WQHD",
        UHD => "UHD",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_canonical_labels() {
        assert_eq!(normalize_resolution("FHD"), FHD);
        assert_eq!(normalize_resolution("wqhd"), WQHD);
        assert_eq!(normalize_resolution("UHD"), UHD);
        assert_eq!(normalize_resolution("1440p"), WQHD);
        assert_eq!(normalize_resolution("4K"), UHD);
        assert_eq!(normalize_resolution("1080p"), FHD);
        assert_eq!(normalize_resolution("QHD"), WQHD);
        assert_eq!(normalize_resolution("2160p"), UHD);
        assert_eq!(normalize_resolution("1920 × 1080"), FHD);
        assert_eq!(normalize_resolution("2560X1440"), WQHD);
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(normalize_resolution("3440x1440"), "3440x1440");
        assert_eq!(normalize_resolution("  Steam Deck "), "Steam Deck");
    }

    #[test]
    fn normalization_is_idempotent() {
        for label in ["FHD", "1920x1080", "3440x1440", "4k", " odd label "] {
            let once = normalize_resolution(label);
            assert_eq!(normalize_resolution(&once), once);
        }
        assert_eq!(
            normalize_resolution(&normalize_resolution("FHD")),
            normalize_resolution("FHD")
        );
    }

    #[test]
    fn short_labels() {
        assert_eq!(short_label(UHD), "UHD");
        assert_eq!(short_label("3440x1440"), "3440x1440");
    }
}
