//! Lookup tables for coded fields.
//!
//! Whether an unknown code is fatal is decided by the caller: interpolation
//! qualifiers, precisions and block layouts must be known, while sampler codes and
//! language versions fall back to a raw dump.

/// Sampler/image type names by `TPSA` code. Gaps are codes not observed yet.
const SAMPLER_NAMES: &[(u32, &str)] = &[
    (5, "sampler2D"),
    (6, "sampler3D"),
    (7, "samplerCube"),
    (8, "sampler2DShadow"),
    (29, "sampler2DArray"),
    (30, "samplerCubeArray"),
    (31, "sampler2DMSArray"),
    (33, "sampler2DArrayShadow"),
    (34, "samplerCubeArrayShadow"),
    (35, "isampler2D"),
    (36, "usampler2D"),
    (37, "sampler2DMS"),
    (38, "samplerCubeShadow"),
    (39, "isampler3D"),
    (40, "isamplerCube"),
    (41, "isampler2DArray"),
    (42, "usampler3D"),
    (43, "usamplerCube"),
    (44, "usampler2DArray"),
    (46, "isampler2DMS"),
    (47, "usampler2DMS"),
    (49, "image2D"),
    (50, "iimage2D"),
    (51, "uimage2D"),
    (52, "image2DArray"),
    (53, "iimage2DArray"),
    (54, "uimage2DArray"),
    (55, "image3D"),
    (56, "iimage3D"),
    (57, "uimage3D"),
    (58, "imageCube"),
    (59, "iimageCube"),
    (60, "uimageCube"),
    (61, "isampler2DMSArray"),
    (62, "usampler2DMSArray"),
    (78, "isamplerCubeArray"),
    (79, "usamplerCubeArray"),
    (80, "imageCubeArray"),
    (81, "iimageCubeArray"),
    (82, "uimageCubeArray"),
    (83, "imageBuffer"),
    (84, "uimageBuffer"),
    (85, "iimageBuffer"),
    (86, "samplerBuffer"),
    (87, "isamplerBuffer"),
    (88, "usamplerBuffer"),
];

pub fn sampler_name(code: u32) -> Option<&'static str> {
    SAMPLER_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// `VELA` code to ESSL version number.
pub fn es_language_version(code: u32) -> Option<u32> {
    match code {
        1 => Some(100),
        2 => Some(300),
        4 => Some(310),
        8 => Some(320),
        _ => None,
    }
}
