use ball_trace::{Detection, TraceRenderer, filter_moving_objects, opacity_weights};
use image::{Rgb, RgbImage};

#[test]
fn test_filter_then_render() {
    // Frame 1: ball seen with a weak duplicate.
    // Frame 2: ball has not moved and is dropped.
    // Frame 3: ball moved to the right half.
    // Frame 4: nothing detected.
    let tracks = vec![
        vec![
            Detection::new("Ball", 0.2, 0.45, 0.3, 0.55, 0.995),
            Detection::new("Ball", 0.6, 0.45, 0.7, 0.55, 0.40),
        ],
        vec![Detection::new("Ball", 0.2, 0.45, 0.3, 0.55, 0.999)],
        vec![Detection::new("Ball", 0.7, 0.45, 0.8, 0.55, 0.998)],
        vec![],
    ];

    let filtered = filter_moving_objects(&tracks, 0.99, 0.001);
    assert_eq!(filtered.len(), tracks.len());
    assert_eq!(filtered.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 0, 1, 0]);
    assert!(filtered.iter().flatten().all(|d| d.score >= 0.99));

    let frames = vec![RgbImage::new(100, 50); 4];
    let annotated = TraceRenderer::new(5).annotate(&frames, &filtered);
    assert_eq!(annotated.len(), frames.len());

    // Trace appears once two centers exist and persists on later frames.
    let black = Rgb([0u8, 0, 0]);
    assert!(annotated[0].pixels().all(|p| *p == black));
    assert!(annotated[1].pixels().all(|p| *p == black));
    assert_ne!(*annotated[2].get_pixel(75, 25), black);
    assert_ne!(*annotated[2].get_pixel(25, 25), black);
    assert_eq!(annotated[2], annotated[3]);

    // The newer point is drawn with the larger weight.
    assert!(annotated[2].get_pixel(75, 25)[0] > annotated[2].get_pixel(25, 25)[0]);
}

#[test]
fn test_opacity_weights_match_decay() {
    let weights = opacity_weights(5);
    let expected: Vec<f32> = (1..=5).rev().map(|age| (-0.2 * age as f32).exp()).collect();
    for (w, e) in weights.iter().zip(&expected) {
        assert!((w - e).abs() < 1e-6);
    }
}
