use mr_data::{cfl, txt};
use proptest::prelude::*;

proptest! {
    /// text export followed by parsing gives back the samples
    #[test]
    fn text_round_trip(samples in proptest::collection::vec(-1.0e6f64..1.0e6, 0..200)) {
        let back = txt::parse_txt(&txt::samples_to_txt(&samples)).unwrap();
        prop_assert_eq!(back,samples);
    }

    /// text output never uses a decimal comma
    #[test]
    fn text_is_locale_free(samples in proptest::collection::vec(-1.0e3f64..1.0e3, 1..50)) {
        let s = txt::samples_to_txt(&samples);
        prop_assert!(!s.contains(','));
        prop_assert_eq!(s.lines().count(),samples.len());
    }

    /// cfl keeps samples at f32 precision
    #[test]
    fn cfl_round_trip(samples in proptest::collection::vec(-100.0f64..100.0, 0..64)) {
        let dir = utils::scratch_dir("cfl_prop").unwrap();
        let base = dir.join("s");
        cfl::write_samples(&samples,&base).unwrap();
        prop_assert_eq!(cfl::load_cfl_header(&base).unwrap(),vec![samples.len(),1,1,1,1]);
        let back = cfl::read_real(&base).unwrap();
        prop_assert_eq!(back.len(),samples.len());
        for (a,b) in back.iter().zip(samples.iter()) {
            prop_assert!((a - b).abs() <= 1e-5*b.abs().max(1.0));
        }
    }
}
