//! # Integration Tests
//!
//! Integration tests and end-to-end tests.
//!
//! Responsibilities:
//! - Contract surface tests
//! - Full pipeline e2e tests (scheduler + calculators)
//! - Filter chain behavior over synthetic frames

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // Verify contracts crate surface is reachable
        let _ = contracts::ConfigVersion::V1;
        assert!(!contracts::Timestamp::INVALID.is_valid());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::rc::Rc;

    use calculators::tags::{
        PARAM_BANNER_IMAGE, PARAM_BAYER_LEVEL, PARAM_BLUE_LEVELS, PARAM_GREEN_LEVELS,
        PARAM_OVERLAY_X, PARAM_OVERLAY_Y, PARAM_PIXEL_SHAPE, PARAM_PIXEL_SIZE, PARAM_RED_LEVELS,
        PARAM_SPREAD, TAG_DITHERED, TAG_GRAYSCALE, TAG_PIXELATED,
    };
    use calculators::{
        BannerCalculator, DitherCalculator, GrayscaleCalculator, PassthroughCalculator,
        PixelateCalculator,
    };
    use contracts::{
        Calculator, CalculatorContext, GraphError, Packet, PixelShape, Port, SideParameters,
        TAG_INPUT, TAG_OUTPUT,
    };
    use imaging::{Image, PixelFormat};
    use scheduler::Scheduler;

    fn drain(scheduler: &mut Scheduler, runs: usize) {
        for _ in 0..runs {
            scheduler.run().expect("scheduler frame failed");
        }
    }

    /// End-to-end test: identity pipeline preserves packet payloads and order.
    #[test]
    fn test_e2e_identity_pipeline() {
        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(
                Box::new(PassthroughCalculator::new("identity")),
                Rc::new(SideParameters::new()),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        for value in 0..10 {
            scheduler.write_to_input_port(Packet::of(value));
        }
        drain(&mut scheduler, 4);

        for expected in 0..10 {
            let packet = scheduler.read_from_output_port();
            assert!(packet.is_valid(), "missing packet {expected}");
            assert_eq!(*packet.get::<i32>().unwrap(), expected);
        }
        assert!(!scheduler.read_from_output_port().is_valid());
    }

    /// Side parameters are shared read-only across every context: two
    /// calculators each read the same tag and forward its value.
    #[test]
    fn test_e2e_shared_side_parameters() {
        struct SideEcho {
            name: String,
            output_tag: String,
            emitted: bool,
        }

        impl Calculator for SideEcho {
            fn name(&self) -> &str {
                &self.name
            }

            fn register_context(&self, side: Rc<SideParameters>) -> CalculatorContext {
                let mut cc = CalculatorContext::new(side);
                cc.add_output_port(self.output_tag.as_str(), Port::new());
                cc
            }

            fn process(
                &mut self,
                cc: &mut CalculatorContext,
                _delta: f64,
            ) -> Result<(), GraphError> {
                if self.emitted {
                    return Ok(());
                }
                self.emitted = true;
                let value = *cc.side_parameter("k")?.get::<i32>()?;
                cc.write_output(self.output_tag.as_str(), Packet::of(value))
            }
        }

        let mut side = SideParameters::new();
        side.insert("k".into(), Packet::of(7i32));
        let side = Rc::new(side);

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(
                Box::new(SideEcho {
                    name: "first".into(),
                    output_tag: "first_out".into(),
                    emitted: false,
                }),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(SideEcho {
                    name: "second".into(),
                    output_tag: TAG_OUTPUT.into(),
                    emitted: false,
                }),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        drain(&mut scheduler, 2);

        // Only the terminal calculator's output reaches the external port,
        // but both must have been able to read the shared parameter.
        let packet = scheduler.read_from_output_port();
        assert!(packet.is_valid());
        assert_eq!(*packet.get::<i32>().unwrap(), 7);
    }

    fn filter_chain_side_parameters(banner: Image) -> Rc<SideParameters> {
        let mut side = SideParameters::new();
        side.insert(PARAM_PIXEL_SIZE.into(), Packet::of(2i32));
        side.insert(PARAM_PIXEL_SHAPE.into(), Packet::of(PixelShape::Square));
        side.insert(PARAM_RED_LEVELS.into(), Packet::of(3i32));
        side.insert(PARAM_GREEN_LEVELS.into(), Packet::of(6i32));
        side.insert(PARAM_BLUE_LEVELS.into(), Packet::of(3i32));
        side.insert(PARAM_SPREAD.into(), Packet::of(0i32));
        side.insert(PARAM_BAYER_LEVEL.into(), Packet::of(2i32));
        side.insert(PARAM_BANNER_IMAGE.into(), Packet::of(banner));
        side.insert(PARAM_OVERLAY_X.into(), Packet::of(0i32));
        side.insert(PARAM_OVERLAY_Y.into(), Packet::of(0i32));
        Rc::new(side)
    }

    /// The reference workload: pixelate -> dither -> grayscale -> banner,
    /// wired purely by tag propagation.
    #[test]
    fn test_e2e_filter_chain() {
        let mut banner = Image::new(2, 2, PixelFormat::Rgba32).unwrap();
        for chunk in banner.data_mut().chunks_mut(4) {
            chunk.copy_from_slice(&[255, 0, 0, 255]);
        }
        let side = filter_chain_side_parameters(banner);

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(PixelateCalculator::new("pixelate")), Rc::clone(&side))
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(
                    DitherCalculator::new("dither").with_io_tags(TAG_PIXELATED, TAG_DITHERED),
                ),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(
                    GrayscaleCalculator::new("grayscale")
                        .with_io_tags(TAG_DITHERED, TAG_GRAYSCALE),
                ),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(BannerCalculator::new("banner").with_io_tags(TAG_GRAYSCALE, TAG_OUTPUT)),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        // Mixed-color frame
        let mut frame = Image::new(8, 8, PixelFormat::Rgba32).unwrap();
        for (index, chunk) in frame.data_mut().chunks_mut(4).enumerate() {
            chunk.copy_from_slice(&[(index * 7) as u8, (index * 13) as u8, 64, 255]);
        }
        scheduler.write_to_input_port(Packet::of(frame));

        drain(&mut scheduler, 4);

        let packet = scheduler.read_from_output_port();
        assert!(packet.is_valid(), "chain produced no frame");
        let out = packet.get::<Image>().unwrap();

        // Banner pixels survived the overlay untouched
        for y in 0..2 {
            for x in 0..2 {
                let offset = out.offset(x, y);
                assert_eq!(
                    &out.data()[offset..offset + 4],
                    &[255, 0, 0, 255],
                    "banner pixel ({x},{y})"
                );
            }
        }

        // Everything outside the banner is grayscale (channels equal)
        for y in 0..8u32 {
            for x in 0..8u32 {
                if x < 2 && y < 2 {
                    continue;
                }
                let offset = out.offset(x, y);
                let px = &out.data()[offset..offset + 4];
                assert_eq!(px[0], px[1], "pixel ({x},{y}) not gray");
                assert_eq!(px[1], px[2], "pixel ({x},{y}) not gray");
                assert_eq!(px[3], 255);
            }
        }
    }

    /// Back-to-back frames flow through the chain in order.
    #[test]
    fn test_e2e_chain_preserves_frame_order() {
        let banner = Image::new(1, 1, PixelFormat::Rgba32).unwrap();
        let side = filter_chain_side_parameters(banner);

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(PixelateCalculator::new("pixelate")), Rc::clone(&side))
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(BannerCalculator::new("banner").with_io_tags(TAG_PIXELATED, TAG_OUTPUT)),
                Rc::clone(&side),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        for value in 0..3u8 {
            let mut frame = Image::new(4, 4, PixelFormat::Rgba32).unwrap();
            frame.data_mut().fill(value * 50);
            scheduler.write_to_input_port(Packet::of(frame));
        }

        drain(&mut scheduler, 4);

        for value in 0..3u8 {
            let packet = scheduler.read_from_output_port();
            assert!(packet.is_valid(), "frame {value} missing");
            let out = packet.get::<Image>().unwrap();
            assert_eq!(out.data()[0], value * 50);
        }
    }

    /// The external entry port still enforces monotonic admission when fed
    /// through `write_to_input_port`.
    #[test]
    fn test_e2e_external_port_is_monotonic() {
        let older = Packet::of(1i32);
        let newer = Packet::of(2i32);

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(
                Box::new(PassthroughCalculator::new("identity")),
                Rc::new(SideParameters::new()),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        scheduler.write_to_input_port(newer);
        scheduler.write_to_input_port(older); // stale, silently dropped

        drain(&mut scheduler, 2);

        let packet = scheduler.read_from_output_port();
        assert_eq!(*packet.get::<i32>().unwrap(), 2);
        assert!(!scheduler.read_from_output_port().is_valid());
    }

    /// Unknown tags propagated downstream are simply ignored.
    #[test]
    fn test_e2e_permissive_tag_propagation() {
        struct MultiOut;
        impl Calculator for MultiOut {
            fn name(&self) -> &str {
                "multi"
            }
            fn register_context(&self, side: Rc<SideParameters>) -> CalculatorContext {
                let mut cc = CalculatorContext::new(side);
                cc.add_output_port("wanted", Port::new());
                cc.add_output_port("ignored", Port::new());
                cc
            }
            fn process(
                &mut self,
                cc: &mut CalculatorContext,
                _delta: f64,
            ) -> Result<(), GraphError> {
                let packet = cc.read_input(TAG_INPUT)?;
                if !packet.is_valid() {
                    return Ok(());
                }
                cc.write_output("wanted", packet)?;
                cc.write_output("ignored", Packet::of(-1i32))
            }
        }

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(MultiOut), Rc::new(SideParameters::new()))
            .unwrap();
        scheduler
            .register_calculator(
                Box::new(PassthroughCalculator::new("relay").with_io_tags("wanted", TAG_OUTPUT)),
                Rc::new(SideParameters::new()),
            )
            .unwrap();
        scheduler.connect_calculators().unwrap();

        scheduler.write_to_input_port(Packet::of(5i32));
        drain(&mut scheduler, 2);

        let packet = scheduler.read_from_output_port();
        assert_eq!(*packet.get::<i32>().unwrap(), 5);
    }
}
