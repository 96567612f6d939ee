use crate::error::{KitError, KitResult};

/// Height every upload master is brought up to.
pub const YOUTUBE_TARGET_HEIGHT: u32 = 2160;
/// Frame rate forced by the lossless master codecs.
pub const MASTER_FPS: u32 = 60;

pub const VHS_VIDEO_LABEL: &str = "[outv]";

/// Luma is squeezed to this share of the frame width before scaling back.
pub const LUMA_SQUEEZE: f64 = 0.4;
/// Chroma is squeezed to `width / CHROMA_SQUEEZE_DIV`.
pub const CHROMA_SQUEEZE_DIV: u32 = 16;

/// Filter-graph payload consumed verbatim by the command assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub video: String,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VhsOptions {
    pub width: u32,
    pub height: u32,
    pub saturation: f64,
    /// `noise` filter strength, 0..100.
    pub noise: u8,
    /// Peak horizontal displacement in pixels.
    pub jitter: f64,
    /// Rows sharing one displacement value.
    pub jitter_band: u32,
    /// Darkening applied to every odd row, 0..1.
    pub scanlines: f64,
    pub lowpass_hz: u32,
}

impl Default for VhsOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            saturation: 0.75,
            noise: 5,
            jitter: 5.5,
            jitter_band: 96,
            scanlines: 0.0,
            lowpass_hz: 4000,
        }
    }
}

/// Brown-noise bed mixed under the source audio.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeNoise {
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub channels: u32,
    pub level_db: f64,
    pub source_volume: f64,
    pub noise_volume: f64,
}

impl Default for TapeNoise {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            bit_depth: 32,
            channels: 2,
            level_db: -22.75,
            source_volume: 1.0,
            noise_volume: 0.077,
        }
    }
}

impl TapeNoise {
    pub fn linear_level(&self) -> f64 {
        10f64.powf(self.level_db / 20.0)
    }
}

fn invalid(msg: impl Into<String>) -> KitError {
    KitError::InvalidFilterParameter(msg.into())
}

#[inline]
fn even_at_least_two(v: u32) -> u32 {
    (v / 2 * 2).max(2)
}

/// Build the VHS graph: plane split, colour bleed, desaturation, noise,
/// jitter and optional scanlines. The audio expression is the sox effect
/// chain applied after the noise bed is mixed in.
pub fn build_vhs_filters(opts: &VhsOptions) -> KitResult<FilterSpec> {
    if opts.width < 2 * CHROMA_SQUEEZE_DIV || opts.width % 2 != 0 {
        return Err(invalid(format!(
            "frame width {} must be even and at least {}",
            opts.width,
            2 * CHROMA_SQUEEZE_DIV
        )));
    }
    if opts.height < 2 || opts.height % 2 != 0 {
        return Err(invalid(format!(
            "frame height {} must be a positive even number",
            opts.height
        )));
    }
    if !(0.0..=3.0).contains(&opts.saturation) {
        return Err(invalid("saturation must be within 0..3"));
    }
    if opts.noise > 100 {
        return Err(invalid("noise must be within 0..100"));
    }
    if !opts.jitter.is_finite() || opts.jitter < 0.0 {
        return Err(invalid("jitter must be a non-negative number"));
    }
    if opts.jitter_band == 0 {
        return Err(invalid("jitter band must be at least one row"));
    }
    if !(0.0..=1.0).contains(&opts.scanlines) {
        return Err(invalid("scanline strength must be within 0..1"));
    }
    if opts.lowpass_hz == 0 {
        return Err(invalid("low-pass cutoff must be above 0 Hz"));
    }

    let (w, h) = (opts.width, opts.height);
    let (cw, ch) = (w / 2, h / 2);
    let luma_w = even_at_least_two((w as f64 * LUMA_SQUEEZE).round() as u32);
    let chroma_w = even_at_least_two(w / CHROMA_SQUEEZE_DIV);

    let mut graph: Vec<String> = vec![
        "format=yuv420p, split=3 [a][b][c]".into(),
        "[a] extractplanes=y [y]".into(),
        "[b] extractplanes=u [u]".into(),
        "[c] extractplanes=v [v]".into(),
        format!("[y] scale={luma_w}:{h}, scale={w}:{h} [luma_scaled]"),
        format!("[u] scale={chroma_w}:{ch}, scale={cw}:{ch} [u_scaled]"),
        format!("[v] scale={chroma_w}:{ch}, scale={cw}:{ch} [v_scaled]"),
        "[luma_scaled][u_scaled][v_scaled] mergeplanes=0x001020:yuv420p [merged]".into(),
    ];

    // colour bleed above must stay ahead of the noise/jitter tail
    let mut tail: Vec<String> = Vec::new();
    if (opts.saturation - 1.0).abs() > 1e-9 {
        tail.push(format!("eq=saturation={}", opts.saturation));
    }
    if opts.noise > 0 {
        tail.push(format!("noise=alls={}:allf=t", opts.noise));
    }
    if opts.jitter > 0.0 || opts.scanlines > 0.0 {
        let mut lum = if opts.jitter > 0.0 {
            format!(
                "lum(X+{}*(random(floor(Y/{}))-0.5),Y)",
                opts.jitter, opts.jitter_band
            )
        } else {
            "lum(X,Y)".to_string()
        };
        if opts.scanlines > 0.0 {
            lum = format!("{lum}*(1-{}*mod(Y,2))", opts.scanlines);
        }
        tail.push(format!("geq='{lum}':cb='cb(X,Y)':cr='cr(X,Y)'"));
    }
    if tail.is_empty() {
        tail.push("null".into());
    }
    graph.push(format!("[merged] {} {VHS_VIDEO_LABEL}", tail.join(", ")));

    Ok(FilterSpec {
        video: graph.join("; "),
        audio: Some(format!("lowpass {}", opts.lowpass_hz)),
    })
}

/// Fade chains for a clip of `clip_duration_s`. A zero duration disables that
/// side. The fade-out start depends on the clip length, so callers probe first.
pub fn build_fade_filters(
    fade_in_s: f64,
    fade_out_s: f64,
    clip_duration_s: f64,
) -> KitResult<FilterSpec> {
    for (name, v) in [("fade-in", fade_in_s), ("fade-out", fade_out_s)] {
        if !v.is_finite() || v < 0.0 {
            return Err(invalid(format!("{name} must be >= 0 (got {v})")));
        }
    }
    if !clip_duration_s.is_finite() || clip_duration_s <= 0.0 {
        return Err(invalid(format!(
            "clip duration must be positive (got {clip_duration_s})"
        )));
    }
    if fade_in_s == 0.0 && fade_out_s == 0.0 {
        return Err(invalid("at least one of fade-in or fade-out is required"));
    }
    if fade_in_s + fade_out_s > clip_duration_s {
        return Err(invalid(format!(
            "fade-in ({fade_in_s:.3}s) + fade-out ({fade_out_s:.3}s) exceed clip duration ({clip_duration_s:.3}s)"
        )));
    }

    let out_start = (clip_duration_s - fade_out_s).max(0.0);

    let mut video = vec![format!("fps={MASTER_FPS}")];
    let mut audio = Vec::new();
    if fade_in_s > 0.0 {
        video.push(format!("fade=t=in:st=0:d={fade_in_s:.3}"));
        audio.push(format!("afade=t=in:st=0:d={fade_in_s:.3}"));
    }
    if fade_out_s > 0.0 {
        video.push(format!("fade=t=out:st={out_start:.3}:d={fade_out_s:.3}"));
        audio.push(format!("afade=t=out:st={out_start:.3}:d={fade_out_s:.3}"));
    }
    video.push("format=yuv420p".into());

    Ok(FilterSpec {
        video: video.join(","),
        audio: Some(audio.join(",")),
    })
}

/// Aspect-preserving scale to `target_height`; width rounds to even.
pub fn build_scale_filter(target_height: u32) -> KitResult<String> {
    validate_scale_height(&target_height.to_string()).map_err(invalid)?;
    Ok(format!("scale=-2:{target_height}"))
}

/// Upscale only when the source falls short of the target.
pub fn upscale_filter(source_height: u32, target_height: u32) -> KitResult<Option<String>> {
    if source_height < target_height {
        build_scale_filter(target_height).map(Some)
    } else {
        Ok(None)
    }
}

pub fn validate_scale_height(raw: &str) -> Result<u32, String> {
    let parsed: u32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` must be a positive even integer"))?;
    if parsed == 0 || parsed % 2 != 0 {
        return Err("scale height must be a positive even integer (e.g., 720, 2160)".into());
    }
    Ok(parsed)
}

pub fn validate_percent_range(raw: &str) -> Result<u8, String> {
    let parsed: u8 = raw
        .parse()
        .map_err(|_| format!("`{raw}` must be an integer between 0 and 100"))?;
    if parsed > 100 {
        return Err("value must be between 0 and 100".into());
    }
    Ok(parsed)
}

pub fn validate_unit_interval(raw: &str) -> Result<f64, String> {
    let parsed: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` must be a number between 0 and 1"))?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err("value must be between 0 and 1".into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC_GRAPH: &str = "format=yuv420p, split=3 [a][b][c]; \
        [a] extractplanes=y [y]; \
        [b] extractplanes=u [u]; \
        [c] extractplanes=v [v]; \
        [y] scale=768:1080, scale=1920:1080 [luma_scaled]; \
        [u] scale=120:540, scale=960:540 [u_scaled]; \
        [v] scale=120:540, scale=960:540 [v_scaled]; \
        [luma_scaled][u_scaled][v_scaled] mergeplanes=0x001020:yuv420p [merged]; \
        [merged] eq=saturation=0.75, noise=alls=5:allf=t, \
        geq='lum(X+5.5*(random(floor(Y/96))-0.5),Y)':cb='cb(X,Y)':cr='cr(X,Y)' [outv]";

    #[test]
    fn test_vhs_defaults_match_classic_graph() {
        let spec = build_vhs_filters(&VhsOptions::default()).unwrap();
        assert_eq!(spec.video, CLASSIC_GRAPH);
        assert_eq!(spec.audio.as_deref(), Some("lowpass 4000"));
    }

    #[test]
    fn test_vhs_stage_order() {
        let spec = build_vhs_filters(&VhsOptions::default()).unwrap();
        let bleed = spec.video.find("mergeplanes").unwrap();
        let noise = spec.video.find("noise=").unwrap();
        let jitter = spec.video.find("geq=").unwrap();
        assert!(bleed < noise && noise < jitter);
        assert!(spec.video.ends_with(VHS_VIDEO_LABEL));
    }

    #[test]
    fn test_vhs_geometry_follows_resolution() {
        let opts = VhsOptions {
            width: 1280,
            height: 720,
            ..VhsOptions::default()
        };
        let spec = build_vhs_filters(&opts).unwrap();
        assert!(spec.video.contains("[y] scale=512:720, scale=1280:720"));
        assert!(spec.video.contains("[u] scale=80:360, scale=640:360"));
    }

    #[test]
    fn test_vhs_scanlines_and_disabled_stages() {
        let opts = VhsOptions {
            scanlines: 0.25,
            jitter: 0.0,
            noise: 0,
            saturation: 1.0,
            ..VhsOptions::default()
        };
        let spec = build_vhs_filters(&opts).unwrap();
        assert!(spec.video.contains("geq='lum(X,Y)*(1-0.25*mod(Y,2))'"));
        assert!(!spec.video.contains("noise="));
        assert!(!spec.video.contains("eq=saturation"));
    }

    #[test]
    fn test_vhs_rejects_bad_parameters() {
        let cases = [
            VhsOptions { width: 1921, ..VhsOptions::default() },
            VhsOptions { height: 0, ..VhsOptions::default() },
            VhsOptions { jitter: -1.0, ..VhsOptions::default() },
            VhsOptions { scanlines: 1.5, ..VhsOptions::default() },
            VhsOptions { noise: 101, ..VhsOptions::default() },
            VhsOptions { jitter_band: 0, ..VhsOptions::default() },
        ];
        for opts in cases {
            assert!(matches!(
                build_vhs_filters(&opts),
                Err(KitError::InvalidFilterParameter(_))
            ));
        }
    }

    #[test]
    fn test_tape_noise_level() {
        let level = TapeNoise::default().linear_level();
        assert!((level - 0.072_861_8).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_fade() {
        let spec = build_fade_filters(2.5, 2.5, 60.0).unwrap();
        assert_eq!(
            spec.video,
            "fps=60,fade=t=in:st=0:d=2.500,fade=t=out:st=57.500:d=2.500,format=yuv420p"
        );
        assert_eq!(
            spec.audio.as_deref(),
            Some("afade=t=in:st=0:d=2.500,afade=t=out:st=57.500:d=2.500")
        );
    }

    #[test]
    fn test_fade_in_only() {
        let spec = build_fade_filters(1.0, 0.0, 10.0).unwrap();
        assert!(spec.video.contains("fade=t=in"));
        assert!(!spec.video.contains("fade=t=out"));
    }

    #[test]
    fn test_fade_bounds() {
        assert!(matches!(
            build_fade_filters(6.0, 5.0, 10.0),
            Err(KitError::InvalidFilterParameter(_))
        ));
        assert!(build_fade_filters(5.0, 5.0, 10.0).is_ok());
        assert!(build_fade_filters(-1.0, 2.0, 10.0).is_err());
        assert!(build_fade_filters(0.0, 0.0, 10.0).is_err());
        assert!(build_fade_filters(1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_scale_filter() {
        assert_eq!(build_scale_filter(2160).unwrap(), "scale=-2:2160");
        assert!(build_scale_filter(721).is_err());
        assert_eq!(upscale_filter(1080, 2160).unwrap().as_deref(), Some("scale=-2:2160"));
        assert_eq!(upscale_filter(2160, 2160).unwrap(), None);
        assert_eq!(upscale_filter(4320, 2160).unwrap(), None);
    }

    #[test]
    fn test_validators() {
        assert_eq!(validate_percent_range("100"), Ok(100));
        assert!(validate_percent_range("101").is_err());
        assert_eq!(validate_unit_interval("0.3"), Ok(0.3));
        assert!(validate_unit_interval("2").is_err());
        assert!(validate_scale_height("0").is_err());
    }
}
