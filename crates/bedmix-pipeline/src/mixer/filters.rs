//! Filter graphs for the three mix tiers.
//!
//! Input `[0:a]` is the music bed and `[1:a]` the speech bed; every graph
//! ends in `[out]`. All tiers mix with `duration=shortest` and a 2s dropout
//! transition, then hard-limit the result.

use bedmix_core::MixTier;

/// Label of the graph's output pad.
pub const OUTPUT_LABEL: &str = "[out]";

/// Four-band vocal clarity EQ applied to speech.
const VOCAL_EQ: &str = "equalizer=f=100:width_type=o:width=2:g=-6,\
equalizer=f=800:width_type=o:width=2:g=4,\
equalizer=f=2000:width_type=o:width=2:g=6,\
equalizer=f=8000:width_type=o:width=2:g=-4";

const MIX: &str = "amix=inputs=2:duration=shortest:dropout_transition=2";
const LIMITER: &str = "alimiter=limit=0.9:attack=5:release=50";

/// Build the filter graph for `tier`.
pub fn filter_graph(tier: MixTier) -> String {
    match tier {
        // Flat gain on music, no normalization anywhere
        MixTier::Immediate => format!(
            "[0:a]volume=0.4[m];\
             [1:a]highpass=f=80,{VOCAL_EQ}[s];\
             [m][s]{MIX},{LIMITER}[out]"
        ),
        // Fast per-track dynamic normalization before mixing
        MixTier::Quick => format!(
            "[0:a]dynaudnorm=f=150:g=11:r=0.9[m_norm];\
             [m_norm]volume=0.4[m_ready];\
             [1:a]highpass=f=80,{VOCAL_EQ},dynaudnorm=f=200:g=15:r=0.9[s_ready];\
             [m_ready][s_ready]{MIX},{LIMITER}[out]"
        ),
        // Loudness standardization: music at -20 LUFS, speech at -16 LUFS
        MixTier::Final => format!(
            "[0:a]loudnorm=I=-20:TP=-2:LRA=11:print_format=summary[m_norm];\
             [m_norm]volume=0.55[m_ready];\
             [1:a]highpass=f=80,pan=stereo|c0=c0|c1=c0,\
             loudnorm=I=-16:TP=-1.5:LRA=11:print_format=summary[s_ready];\
             [m_ready][s_ready]{MIX}[mixed];\
             [mixed]{LIMITER}[out]"
        ),
    }
}
