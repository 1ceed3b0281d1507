//! Surface negotiation for the volume output.
//!
//! The ray pass blends premultiplied colour over the cleared host target, so
//! the surface needs an 8-bit RGBA/BGRA format and, unless the caller asks
//! otherwise, an opaque compositor mode.

use winit::dpi::PhysicalSize;

use super::error::SurfaceErrorAction;

const COLOR_FORMATS: [wgpu::TextureFormat; 4] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
    wgpu::TextureFormat::Bgra8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
];

/// First supported 8-bit colour format matching the sRGB preference, then any
/// 8-bit colour format, then whatever the surface lists first.
pub(crate) fn pick_format(supported: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let usable = |f: &wgpu::TextureFormat| COLOR_FORMATS.contains(f) && supported.contains(f);
    COLOR_FORMATS
        .iter()
        .copied()
        .filter(usable)
        .find(|f| f.is_srgb() == prefer_srgb)
        .or_else(|| COLOR_FORMATS.iter().copied().find(usable))
        .or_else(|| supported.first().copied())
}

pub(crate) fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| {
            supported
                .contains(&wgpu::CompositeAlphaMode::Opaque)
                .then_some(wgpu::CompositeAlphaMode::Opaque)
        })
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Minimized windows report 0x0; such sizes are tracked but never configured.
pub(crate) fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

/// Lost and outdated surfaces are reconfigured, memory exhaustion is fatal,
/// everything else drops the frame.
pub(crate) fn recovery_for(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode as Alpha, TextureFormat as Format};

    // ── format ────────────────────────────────────────────────────────────

    #[test]
    fn srgb_preference_is_honoured() {
        let supported = [Format::Rgba8Unorm, Format::Bgra8UnormSrgb];
        assert_eq!(pick_format(&supported, true), Some(Format::Bgra8UnormSrgb));
        assert_eq!(pick_format(&supported, false), Some(Format::Rgba8Unorm));
    }

    #[test]
    fn falls_back_to_other_colour_space() {
        assert_eq!(pick_format(&[Format::Rgba8Unorm], true), Some(Format::Rgba8Unorm));
    }

    #[test]
    fn unknown_formats_use_first_listed() {
        assert_eq!(pick_format(&[Format::Rgb10a2Unorm], true), Some(Format::Rgb10a2Unorm));
        assert_eq!(pick_format(&[], true), None);
    }

    // ── alpha ─────────────────────────────────────────────────────────────

    #[test]
    fn supported_request_wins() {
        let supported = [Alpha::Opaque, Alpha::PreMultiplied];
        assert_eq!(pick_alpha_mode(&supported, Some(Alpha::PreMultiplied)), Alpha::PreMultiplied);
    }

    #[test]
    fn opaque_preferred_otherwise() {
        let supported = [Alpha::Inherit, Alpha::Opaque];
        assert_eq!(pick_alpha_mode(&supported, Some(Alpha::PostMultiplied)), Alpha::Opaque);
        assert_eq!(pick_alpha_mode(&supported, None), Alpha::Opaque);
        assert_eq!(pick_alpha_mode(&[Alpha::Inherit], None), Alpha::Inherit);
        assert_eq!(pick_alpha_mode(&[], None), Alpha::Auto);
    }

    // ── resize / errors ───────────────────────────────────────────────────

    #[test]
    fn minimized_windows_are_not_drawable() {
        assert!(!is_drawable(PhysicalSize::new(0, 600)));
        assert!(!is_drawable(PhysicalSize::new(800, 0)));
        assert!(is_drawable(PhysicalSize::new(1, 1)));
    }

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(recovery_for(&wgpu::SurfaceError::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(recovery_for(&wgpu::SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(recovery_for(&wgpu::SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
        assert_eq!(recovery_for(&wgpu::SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
    }
}
