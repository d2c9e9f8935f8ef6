use std::fmt;
use std::str::FromStr;

use crate::error::ExportError;

/// How a 3-D grid is reduced for export.
///
/// Every mode except [`Vtk`](Self::Vtk) produces a whitespace-separated
/// text table. Slices and lines pass through the mid-plane `n / 2` of each
/// axis they do not span.
///
/// ```text
/// ┌───────────────┬─────────────────────────────────────────────────┐
/// │ Mode          │ Output                                          │
/// ├───────────────┼─────────────────────────────────────────────────┤
/// │ xyz           │ x y z v for every cell                          │
/// │ xy / yz / zx  │ 2-D slice through the mid-plane                 │
/// │ x / y / z     │ 1-D line through the centre                     │
/// │ zxaverage     │ z x v, v averaged over y                        │
/// │ xaverage      │ x and seven y-band means in the z mid-plane     │
/// │ whole_average │ single mean over the grid                       │
/// │ vtk           │ XML ImageData file                              │
/// └───────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    Xyz,
    Xy,
    Yz,
    Zx,
    X,
    Y,
    Z,
    ZxAverage,
    XAverage,
    WholeAverage,
    Vtk,
}

impl ProjectionMode {
    pub const ALL: [Self; 11] = [
        Self::Xyz,
        Self::Xy,
        Self::Yz,
        Self::Zx,
        Self::X,
        Self::Y,
        Self::Z,
        Self::ZxAverage,
        Self::XAverage,
        Self::WholeAverage,
        Self::Vtk,
    ];

    /// Name used in plot selections and output file names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Xyz => "xyz",
            Self::Xy => "xy",
            Self::Yz => "yz",
            Self::Zx => "zx",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::ZxAverage => "zxaverage",
            Self::XAverage => "xaverage",
            Self::WholeAverage => "whole_average",
            Self::Vtk => "vtk",
        }
    }

    #[must_use]
    pub fn is_text(self) -> bool {
        self != Self::Vtk
    }

    /// Parse a space-separated mode list such as `"xy x y"`.
    ///
    /// Unknown names are returned as errors alongside the modes that did
    /// parse, so one typo does not drop the whole entry.
    pub fn parse_list(list: &str) -> (Vec<Self>, Vec<ExportError>) {
        let mut modes = Vec::new();
        let mut errors = Vec::new();
        for word in list.split_whitespace() {
            match word.parse() {
                Ok(mode) => modes.push(mode),
                Err(e) => errors.push(e),
            }
        }
        (modes, errors)
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ExportError::UnsupportedMode {
                mode: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for mode in ProjectionMode::ALL {
            assert_eq!(mode.to_string().parse::<ProjectionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "xz".parse::<ProjectionMode>().unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedMode { ref mode } if mode == "xz"));
    }

    #[test]
    fn list_keeps_valid_entries() {
        let (modes, errors) = ProjectionMode::parse_list("xy  bogus vtk");
        assert_eq!(modes, vec![ProjectionMode::Xy, ProjectionMode::Vtk]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn empty_list_is_empty() {
        let (modes, errors) = ProjectionMode::parse_list("");
        assert!(modes.is_empty() && errors.is_empty());
    }
}
