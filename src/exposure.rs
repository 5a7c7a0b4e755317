/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Exposure, frame length and gain control.
//!
//! Shutter and frame length are one coupled quantity in sensor line units:
//! the frame must always be at least `margin` lines longer than the shutter,
//! and the frame length sets the frame rate. [`ExposureController`] owns that
//! state for the active scenario and turns application requests into ordered
//! [`WritePlan`]s. It never touches the bus itself; apply the returned plans
//! through a [`RegisterIo`](crate::io::RegisterIo).
//!
//! If applying a shutter plan fails part way (frame length written, shutter
//! not), repeat the whole `set_shutter` call. The plan is recomputed from
//! the latched state, so repeating it is safe.

use crate::plan::WritePlan;
use crate::profile::TimingProfile;
use crate::regmap::{DataWidth, RegisterMap};

/// Frame duration used while long exposure ("night") mode is on
pub const DEFAULT_LONG_EXPOSURE_MS: u32 = 1500;

/// Frame rates, x10, that autoflicker pulls down to the flicker-safe rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlickerBand {
    pub low_fps_x10: u32,
    pub high_fps_x10: u32,
    pub target_fps_x10: u32,
}

impl FlickerBand {
    pub const fn new(low_fps_x10: u32, high_fps_x10: u32, target_fps_x10: u32) -> Self {
        Self {
            low_fps_x10,
            high_fps_x10,
            target_fps_x10,
        }
    }

    pub fn contains(&self, fps_x10: u32) -> bool {
        fps_x10 >= self.low_fps_x10 && fps_x10 <= self.high_fps_x10
    }
}

/// Bands tuned against existing ISP flicker detection; keep them as is
pub const DEFAULT_FLICKER_BANDS: [FlickerBand; 2] = [
    FlickerBand::new(297, 305, 296),
    FlickerBand::new(147, 150, 146),
];

/// Chip level settings that do not change with the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureConfig {
    pub registers: RegisterMap,
    pub data_width: DataWidth,
    pub long_exposure_ms: u32,
    pub flicker_bands: [FlickerBand; 2],
}

impl ExposureConfig {
    pub const fn new(registers: RegisterMap, data_width: DataWidth) -> Self {
        Self {
            registers,
            data_width,
            long_exposure_ms: DEFAULT_LONG_EXPOSURE_MS,
            flicker_bands: DEFAULT_FLICKER_BANDS,
        }
    }
}

/// Mutable timing state of the active scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureState {
    pub shutter_lines: u32,
    pub frame_length_lines: u32,
    pub min_frame_length_lines: u32,
    /// Signed change of the frame length, see the operation that set it
    pub dummy_line: i32,
    pub gain_reg: u16,
    pub autoflicker_enabled: bool,
    pub long_exposure_mode: bool,
    pub lshift_count: u8,
}

impl ExposureState {
    fn seeded(profile: &TimingProfile) -> Self {
        Self {
            shutter_lines: u32::from(profile.min_shutter_lines),
            frame_length_lines: profile.default_frame_length_lines,
            min_frame_length_lines: profile.default_frame_length_lines,
            dummy_line: 0,
            gain_reg: 0,
            autoflicker_enabled: false,
            long_exposure_mode: false,
            lshift_count: 0,
        }
    }
}

/// Converts shutter, gain and frame rate requests into register plans
#[derive(Debug, Clone)]
pub struct ExposureController {
    config: ExposureConfig,
    profile: TimingProfile,
    state: ExposureState,
}

impl ExposureController {
    pub fn new(config: ExposureConfig, profile: TimingProfile) -> Self {
        Self {
            config,
            state: ExposureState::seeded(&profile),
            profile,
        }
    }

    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    /// Profile of the active scenario
    pub fn profile(&self) -> &TimingProfile {
        &self.profile
    }

    pub fn state(&self) -> &ExposureState {
        &self.state
    }

    /// Switch scenario: frame length restarts from the new default and any
    /// long exposure shift is dropped.
    pub fn select_scenario(&mut self, profile: TimingProfile) {
        self.profile = profile;
        self.state.frame_length_lines = profile.default_frame_length_lines;
        self.state.min_frame_length_lines = profile.default_frame_length_lines;
        self.state.dummy_line = 0;
        self.state.lshift_count = 0;
        self.state.long_exposure_mode = false;
    }

    pub fn set_autoflicker(&mut self, enabled: bool) {
        self.state.autoflicker_enabled = enabled;
    }

    pub fn set_long_exposure_mode(&mut self, enabled: bool) {
        self.state.long_exposure_mode = enabled;
    }

    fn new_plan(&self) -> WritePlan {
        WritePlan::new(self.config.registers.group_hold)
    }

    /// Clamp a Q6 gain to the scenario range and encode it.
    ///
    /// Returns the applied gain, which is the clamped request rather than
    /// whatever the register code decodes back to.
    pub fn set_gain(&mut self, requested_q6: u16) -> (u16, WritePlan) {
        let applied = requested_q6
            .max(self.profile.min_gain_q6)
            .min(self.profile.max_gain_q6);
        if applied != requested_q6 {
            debug_log!("gain {} clamped to {}", requested_q6, applied);
        }

        let code = self.profile.gain_law.encode(applied);
        self.state.gain_reg = code.analog;

        let regs = &self.config.registers;
        let width = self.config.data_width;
        let mut plan = self.new_plan();
        plan.field(regs.analog_gain, u32::from(code.analog), width);
        if let (Some(pregain), Some(field)) = (code.pregain, regs.digital_gain) {
            plan.field(field, u32::from(pregain), width);
        }
        (applied, plan)
    }

    /// Set the exposure in lines, growing the frame when the shutter needs it.
    ///
    /// Returns the shutter actually latched, in the units written to the
    /// shutter register (after any long exposure shift).
    pub fn set_shutter(&mut self, requested_lines: u32, autoflicker: bool) -> (u32, WritePlan) {
        self.write_shutter(requested_lines, autoflicker, false)
    }

    /// As [`set_shutter`](Self::set_shutter), and also latch the resulting
    /// frame length as the new frame rate floor
    pub fn set_shutter_with_floor(
        &mut self,
        requested_lines: u32,
        autoflicker: bool,
    ) -> (u32, WritePlan) {
        self.write_shutter(requested_lines, autoflicker, true)
    }

    fn write_shutter(
        &mut self,
        requested_lines: u32,
        autoflicker: bool,
        latch_min: bool,
    ) -> (u32, WritePlan) {
        let profile = self.profile;
        let (mut frame_length, mut shutter) = self.frame_for_shutter(requested_lines);

        if self.state.long_exposure_mode {
            frame_length = profile
                .frame_length_for_duration_ms(self.config.long_exposure_ms)
                .max(self.state.min_frame_length_lines)
                .min(profile.max_frame_length_lines);
        }
        shutter = self.shutter_within(shutter, frame_length);

        let lshift_count = match self.shift_into_cap(frame_length, shutter) {
            Some((shifted_frame, shifted_shutter, count)) => {
                frame_length = shifted_frame;
                shutter = shifted_shutter;
                count
            }
            None => {
                if autoflicker {
                    frame_length = self.flicker_adjust(frame_length);
                    shutter = self.shutter_within(shutter, frame_length);
                }
                0
            }
        };
        let (frame_length, shutter) = self.fit_registers(frame_length, shutter);

        if shutter != requested_lines {
            debug_log!("shutter {} clamped to {}", requested_lines, shutter);
        }

        let regs = &self.config.registers;
        let width = self.config.data_width;
        let mut plan = self.new_plan();
        plan.field(regs.frame_length, frame_length, width);
        if let Some(field) = regs.lshift {
            // zero when not shifting so an earlier shift does not linger
            plan.field(field, u32::from(lshift_count), width);
        }
        plan.field(regs.coarse_integration, shutter, width);

        self.state.shutter_lines = shutter;
        self.state.frame_length_lines = frame_length;
        self.state.lshift_count = lshift_count;
        self.state.dummy_line = line_delta(frame_length, self.state.min_frame_length_lines);
        if latch_min {
            self.state.min_frame_length_lines = frame_length;
        }
        (shutter, plan)
    }

    /// Keep the shutter inside the frame and above the sensor minimum
    fn shutter_within(&self, shutter: u32, frame_length: u32) -> u32 {
        shutter
            .min(frame_length.saturating_sub(u32::from(self.profile.margin_lines)))
            .max(u32::from(self.profile.min_shutter_lines))
    }

    /// Long exposure re-encoding: halve frame length and shutter until the
    /// frame fits the coarse integration cap. `None` when no shift is needed.
    ///
    /// Past `max_lshift_count` the count is clamped and the exposure is
    /// silently shortened.
    fn shift_into_cap(&self, frame_length: u32, shutter: u32) -> Option<(u32, u32, u8)> {
        let cap = self.profile.max_coarse_integration_lines?;
        if frame_length <= cap {
            return None;
        }
        debug_log!("long exposure: frame length {} over {}", frame_length, cap);

        let mut frame_length = frame_length;
        let mut shutter = shutter;
        let mut shifts = 0u32;
        while frame_length > cap {
            frame_length /= 2;
            shutter /= 2;
            shifts += 1;
        }
        let count = shifts.min(u32::from(self.profile.max_lshift_count)) as u8;
        let margin = u32::from(self.profile.margin_lines);
        let shutter = self.shutter_within(shutter.min(cap.saturating_sub(margin)), frame_length);
        debug_log!("shifted to {} lshift {}", frame_length, count);
        Some((frame_length, shutter, count))
    }

    /// Clamp frame length and shutter to what their registers can hold
    fn fit_registers(&self, frame_length: u32, shutter: u32) -> (u32, u32) {
        let regs = &self.config.registers;
        let frame_max = regs.frame_length.max_value();
        let frame_length = if frame_length > frame_max {
            debug_log!("frame length {} clamped to register max {}", frame_length, frame_max);
            frame_max
        } else {
            frame_length
        };
        let shutter = self.shutter_within(
            shutter.min(regs.coarse_integration.max_value()),
            frame_length,
        );
        (frame_length, shutter)
    }

    /// Frame length and clamped shutter for a request, before any long
    /// exposure or flicker correction
    fn frame_for_shutter(&self, requested_lines: u32) -> (u32, u32) {
        let profile = &self.profile;
        let margin = u32::from(profile.margin_lines);
        let min_frame_length = self.state.min_frame_length_lines;

        let frame_length = if requested_lines > min_frame_length.saturating_sub(margin) {
            requested_lines.saturating_add(margin)
        } else {
            min_frame_length
        }
        .min(profile.max_frame_length_lines);

        let shutter = requested_lines
            .max(u32::from(profile.min_shutter_lines))
            .min(profile.max_shutter_lines());
        (frame_length, shutter)
    }

    /// Snap frame rates that sit just above a flicker-safe rate down to it
    fn flicker_adjust(&self, frame_length: u32) -> u32 {
        let realtime_fps_x10 = self.profile.fps_x10_for_frame_length(frame_length);
        match self
            .config
            .flicker_bands
            .iter()
            .find(|band| band.contains(realtime_fps_x10))
        {
            Some(band) => {
                debug_log!(
                    "autoflicker: {} -> {} fps x10",
                    realtime_fps_x10,
                    band.target_fps_x10
                );
                self.max_framerate_frame_length(band.target_fps_x10)
            }
            None => frame_length,
        }
    }

    fn max_framerate_frame_length(&self, target_fps_x10: u32) -> u32 {
        self.profile
            .frame_length_for_fps(target_fps_x10)
            .max(self.state.min_frame_length_lines)
            .min(self.profile.max_frame_length_lines)
            .min(self.config.registers.frame_length.max_value())
    }

    /// Cap the frame rate at `target_fps_x10` by stretching the frame.
    ///
    /// Only frame length and line length are written; shutter and lshift are
    /// left alone.
    pub fn apply_max_framerate(&mut self, target_fps_x10: u32, latch_as_min: bool) -> WritePlan {
        let frame_length = self.max_framerate_frame_length(target_fps_x10);
        self.state.dummy_line = line_delta(frame_length, self.state.min_frame_length_lines);
        self.state.frame_length_lines = frame_length;
        if latch_as_min {
            self.state.min_frame_length_lines = frame_length;
        }

        let regs = &self.config.registers;
        let width = self.config.data_width;
        let mut plan = self.new_plan();
        plan.field(regs.frame_length, frame_length, width);
        plan.field(
            regs.line_length,
            u32::from(self.profile.line_length_pck),
            width,
        );
        plan
    }

    /// Exposure update with an explicit target frame length, used when
    /// several sensors or 3A blocks share one frame timing.
    ///
    /// The target becomes the new frame length floor; how far it moved from
    /// the previous frame length (negative when it shrank) is kept as
    /// `dummy_line`. Auto extension is switched off, and long exposures are
    /// re-encoded with a shift exactly as in [`set_shutter`](Self::set_shutter).
    pub fn apply_shutter_and_frame_length(
        &mut self,
        shutter_lines: u32,
        frame_length_lines: u32,
    ) -> (u32, WritePlan) {
        let profile = self.profile;
        let margin = u32::from(profile.margin_lines);

        if frame_length_lines < margin {
            debug_log!(
                "frame length {} below margin {}, raised",
                frame_length_lines,
                margin
            );
        }
        let target = frame_length_lines
            .max(margin)
            .min(profile.max_frame_length_lines);
        self.state.dummy_line = line_delta(target, self.state.frame_length_lines);
        self.state.min_frame_length_lines = target;

        let (mut frame_length, shutter) = self.frame_for_shutter(shutter_lines);
        let mut shutter = self.shutter_within(shutter, frame_length);
        let lshift_count = match self.shift_into_cap(frame_length, shutter) {
            Some((shifted_frame, shifted_shutter, count)) => {
                frame_length = shifted_frame;
                shutter = shifted_shutter;
                count
            }
            None => {
                if self.state.autoflicker_enabled {
                    frame_length = self.flicker_adjust(frame_length);
                    shutter = self.shutter_within(shutter, frame_length);
                }
                0
            }
        };
        let (frame_length, shutter) = self.fit_registers(frame_length, shutter);

        let regs = &self.config.registers;
        let width = self.config.data_width;
        let mut plan = self.new_plan();
        plan.field(regs.frame_length, frame_length, width);
        if let Some(field) = regs.lshift {
            plan.field(field, u32::from(lshift_count), width);
        }
        if let Some(field) = regs.auto_extend {
            plan.field(field, 0, width);
        }
        plan.field(regs.coarse_integration, shutter, width);

        self.state.shutter_lines = shutter;
        self.state.frame_length_lines = frame_length;
        self.state.lshift_count = lshift_count;
        (shutter, plan)
    }
}

/// `to - from` in lines, saturated to the `i32` range
fn line_delta(to: u32, from: u32) -> i32 {
    let delta = i64::from(to) - i64::from(from);
    delta.max(i64::from(i32::MIN)).min(i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gain::GainLaw;
    use crate::regmap::RegisterField;

    const PROFILE: TimingProfile = TimingProfile {
        pixel_clock_hz: 89_700_000,
        line_length_pck: 1495,
        default_frame_length_lines: 3000,
        margin_lines: 16,
        min_shutter_lines: 4,
        max_frame_length_lines: 0x7FFFF,
        max_coarse_integration_lines: None,
        max_lshift_count: 0,
        min_gain_q6: 64,
        max_gain_q6: 1024,
        gain_law: GainLaw::Linear,
    };

    const SHIFTING: TimingProfile = TimingProfile {
        max_frame_length_lines: 0xFFFFF,
        max_coarse_integration_lines: Some(65535),
        max_lshift_count: 7,
        ..PROFILE
    };

    fn controller(profile: TimingProfile) -> ExposureController {
        ExposureController::new(
            ExposureConfig::new(RegisterMap::SMIA_LSHIFT, DataWidth::Byte),
            profile,
        )
    }

    #[test]
    fn short_shutter_keeps_default_frame() {
        let mut ctl = controller(PROFILE);
        let (applied, plan) = ctl.set_shutter(2000, false);
        assert_eq!(applied, 2000);
        assert_eq!(ctl.state().frame_length_lines, 3000);
        assert_eq!(plan.value_at(0x0340), Some(0x0B));
        assert_eq!(plan.value_at(0x0341), Some(0xB8));
        assert_eq!(plan.value_at(0x3100), Some(0));
    }

    #[test]
    fn long_shutter_extends_frame() {
        let mut ctl = controller(PROFILE);
        let (applied, _) = ctl.set_shutter(5000, false);
        assert_eq!(applied, 5000);
        assert_eq!(ctl.state().frame_length_lines, 5016);
        assert_eq!(ctl.state().dummy_line, 2016);
    }

    #[test]
    fn shutter_below_minimum_is_raised() {
        let mut ctl = controller(PROFILE);
        assert_eq!(ctl.set_shutter(1, false).0, 4);
    }

    #[test]
    fn write_order_frame_lshift_shutter() {
        let mut ctl = controller(PROFILE);
        let (_, plan) = ctl.set_shutter(2000, false);
        let addrs: std::vec::Vec<u16> = plan.iter().map(|w| w.addr).collect();
        assert_eq!(
            addrs,
            [0x0104, 0x0340, 0x0341, 0x3100, 0x0202, 0x0203, 0x0104]
        );
    }

    #[test]
    fn overflow_shifts_until_it_fits() {
        let mut ctl = controller(SHIFTING);
        let (applied, plan) = ctl.set_shutter(199_984, false);
        let state = ctl.state();
        assert_eq!(state.lshift_count, 2);
        assert_eq!(state.frame_length_lines, 50_000);
        assert_eq!(applied, 49_984);
        assert_eq!(plan.value_at(0x3100), Some(2));
    }

    #[test]
    fn lshift_cap_truncates() {
        let mut ctl = controller(TimingProfile {
            max_lshift_count: 1,
            ..SHIFTING
        });
        ctl.set_shutter(199_984, false);
        assert_eq!(ctl.state().lshift_count, 1);
        assert_eq!(ctl.state().frame_length_lines, 50_000);
    }

    #[test]
    fn leaving_overflow_zeroes_lshift() {
        let mut ctl = controller(SHIFTING);
        ctl.set_shutter(199_984, false);
        let (_, plan) = ctl.set_shutter(1000, false);
        assert_eq!(ctl.state().lshift_count, 0);
        assert_eq!(plan.value_at(0x3100), Some(0));
    }

    #[test]
    fn night_mode_frame_length() {
        let mut ctl = ExposureController::new(
            ExposureConfig::new(
                RegisterMap {
                    frame_length: RegisterField::new(0x0340, 3),
                    ..RegisterMap::SMIA_LSHIFT
                },
                DataWidth::Byte,
            ),
            PROFILE,
        );
        ctl.set_long_exposure_mode(true);
        let (applied, _) = ctl.set_shutter(2000, false);
        assert_eq!(applied, 2000);
        assert_eq!(ctl.state().frame_length_lines, 90_000);

        // a 16-bit frame length register cannot hold 1.5 s at this clock
        let mut ctl = controller(PROFILE);
        ctl.set_long_exposure_mode(true);
        let (applied, plan) = ctl.set_shutter(2000, false);
        assert_eq!(applied, 2000);
        assert_eq!(ctl.state().frame_length_lines, 0xFFFF);
        assert_eq!(plan.value_at(0x0340), Some(0xFF));
        assert_eq!(plan.value_at(0x0341), Some(0xFF));

        let mut ctl = controller(SHIFTING);
        ctl.set_long_exposure_mode(true);
        let (applied, _) = ctl.set_shutter(2000, false);
        assert_eq!(ctl.state().frame_length_lines, 45_000);
        assert_eq!(ctl.state().lshift_count, 1);
        assert_eq!(applied, 1000);
    }

    #[test]
    fn autoflicker_snaps_thirty_fps() {
        let mut ctl = controller(TimingProfile {
            default_frame_length_lines: 2000,
            ..PROFILE
        });
        ctl.set_shutter(100, true);
        let fl = ctl.state().frame_length_lines;
        assert_eq!(fl, 2027);
        assert_eq!(ctl.profile().fps_x10_for_frame_length(fl), 296);
        // floor is untouched by the snap
        assert_eq!(ctl.state().min_frame_length_lines, 2000);
    }

    #[test]
    fn autoflicker_snaps_fifteen_fps() {
        let mut ctl = controller(TimingProfile {
            default_frame_length_lines: 4054,
            ..PROFILE
        });
        ctl.set_shutter(100, true);
        let fl = ctl.state().frame_length_lines;
        assert_eq!(fl, 4109);
        assert_eq!(ctl.profile().fps_x10_for_frame_length(fl), 146);
    }

    #[test]
    fn autoflicker_snap_respects_floor() {
        let mut ctl = controller(PROFILE);
        // 30 fps snaps to 2027 lines, under the 3000 line floor
        ctl.set_shutter(100, true);
        assert_eq!(ctl.state().frame_length_lines, 3000);
    }

    #[test]
    fn max_framerate_latches_floor() {
        let mut ctl = controller(PROFILE);
        let plan = ctl.apply_max_framerate(150, true);
        assert_eq!(ctl.state().frame_length_lines, 4000);
        assert_eq!(ctl.state().min_frame_length_lines, 4000);
        assert_eq!(ctl.state().dummy_line, 1000);
        assert_eq!(plan.value_at(0x0342), Some(0x05));
        assert_eq!(plan.value_at(0x0343), Some(0xD7));
        assert_eq!(plan.value_at(0x0202), None);
        assert_eq!(plan.value_at(0x3100), None);

        // faster than the floor allows
        ctl.apply_max_framerate(300, false);
        assert_eq!(ctl.state().frame_length_lines, 4000);
    }

    #[test]
    fn shutter_with_floor_latches() {
        let mut ctl = controller(PROFILE);
        ctl.set_shutter_with_floor(5000, false);
        assert_eq!(ctl.state().min_frame_length_lines, 5016);
        ctl.set_shutter(100, false);
        assert_eq!(ctl.state().frame_length_lines, 5016);
    }

    #[test]
    fn explicit_frame_length() {
        let mut ctl = controller(PROFILE);
        let (applied, plan) = ctl.apply_shutter_and_frame_length(1000, 3300);
        assert_eq!(applied, 1000);
        assert_eq!(ctl.state().frame_length_lines, 3300);
        assert_eq!(ctl.state().min_frame_length_lines, 3300);
        assert_eq!(ctl.state().dummy_line, 300);
        assert_eq!(plan.value_at(0x0350), Some(0));
    }

    #[test]
    fn long_shutter_is_clamped_to_the_register() {
        let mut ctl = controller(PROFILE);
        let (applied, plan) = ctl.set_shutter(100_000, false);
        assert_eq!(applied, 0xFFFF - 16);
        assert_eq!(ctl.state().frame_length_lines, 0xFFFF);
        assert_eq!(plan.value_at(0x0202), Some(0xFF));
        assert_eq!(plan.value_at(0x0203), Some(0xEF));
    }

    #[test]
    fn slow_frame_rate_is_clamped_to_the_register() {
        let mut ctl = controller(PROFILE);
        ctl.apply_max_framerate(5, false);
        assert_eq!(ctl.state().frame_length_lines, 0xFFFF);
    }

    #[test]
    fn explicit_frame_length_reencodes_long_exposures() {
        let mut ctl = controller(SHIFTING);
        let (applied, plan) = ctl.apply_shutter_and_frame_length(100_000, 3000);
        let state = ctl.state();
        assert_eq!(state.lshift_count, 1);
        assert_eq!(state.frame_length_lines, 50_008);
        assert_eq!(applied, 49_992);
        assert_eq!(plan.value_at(0x3100), Some(1));
        assert_eq!(plan.value_at(0x0350), Some(0));

        ctl.apply_shutter_and_frame_length(1000, 3000);
        assert_eq!(ctl.state().lshift_count, 0);
    }

    #[test]
    fn shrinking_frame_gives_negative_dummy_line() {
        let mut ctl = controller(PROFILE);
        ctl.apply_shutter_and_frame_length(1000, 2500);
        assert_eq!(ctl.state().dummy_line, -500);
        assert_eq!(ctl.state().frame_length_lines, 2500);
    }

    #[test]
    fn explicit_frame_length_below_margin_is_raised() {
        let mut ctl = controller(PROFILE);
        let (applied, _) = ctl.apply_shutter_and_frame_length(100, 3);
        assert_eq!(ctl.state().min_frame_length_lines, 16);
        assert_eq!(ctl.state().frame_length_lines, 116);
        assert_eq!(applied, 100);
    }

    #[test]
    fn scenario_switch_resets_timing() {
        let mut ctl = controller(SHIFTING);
        ctl.set_long_exposure_mode(true);
        ctl.set_shutter(199_984, false);
        ctl.select_scenario(TimingProfile {
            default_frame_length_lines: 4000,
            ..PROFILE
        });
        let state = ctl.state();
        assert_eq!(state.frame_length_lines, 4000);
        assert_eq!(state.min_frame_length_lines, 4000);
        assert_eq!(state.lshift_count, 0);
        assert!(!state.long_exposure_mode);
    }

    #[test]
    fn gain_plan_touches_gain_registers_only() {
        let mut ctl = controller(PROFILE);
        let (applied, plan) = ctl.set_gain(100);
        assert_eq!(applied, 100);
        assert_eq!(plan.value_at(0x0204), Some(0));
        assert_eq!(plan.value_at(0x0205), Some(50));
        assert_eq!(plan.writes().len(), 2);
        assert_eq!(ctl.state().gain_reg, 50);
    }
}
