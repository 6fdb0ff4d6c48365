use common::shapes::*;
use common::vector::Vector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::{FRAC_PI_2, PI};

const EPS: f64 = 1e-12;

#[test]
fn test_grid_rect_getters() {
    let rect = GridRect::new(2, 3, 4, 6);
    assert_eq!(rect.width(), 4);
    assert_eq!(rect.height(), 6);
    assert_eq!(rect.left(), 2);
    assert_eq!(rect.right(), 6);
    assert_eq!(rect.top(), 3);
    assert_eq!(rect.bottom(), 9);
    assert_eq!(rect.area(), 24);
    assert_eq!(rect.center(), GridPos::new(4, 6));
}

#[test]
fn test_grid_rect_contains_is_half_open() {
    let rect = GridRect::sized(10, 10);
    assert!(rect.contains(GridPos::new(0, 0)));
    assert!(rect.contains(GridPos::new(9, 9)));
    assert!(!rect.contains(GridPos::new(10, 0)));
    assert!(!rect.contains(GridPos::new(0, 10)));
    assert!(!rect.contains(GridPos::new(-1, 5)));
}

#[test]
fn test_grid_rect_index_of() {
    let rect = GridRect::new(-2, -2, 5, 4);
    assert_eq!(rect.index_of(GridPos::new(-2, -2)), Some(0));
    assert_eq!(rect.index_of(GridPos::new(2, -2)), Some(4));
    assert_eq!(rect.index_of(GridPos::new(-2, -1)), Some(5));
    assert_eq!(rect.index_of(GridPos::new(2, 1)), Some(19));
    assert_eq!(rect.index_of(GridPos::new(3, 1)), None);
}

#[test]
fn test_get_random_cell_inside() {
    let rect = GridRect::new(2, 3, 6, 8);
    let mut rng: StdRng = SeedableRng::seed_from_u64(123);

    for _ in 0..100 {
        let cell = rect.get_random_cell_inside(1, &mut rng);
        assert!(cell.x >= 3 && cell.x <= 6);
        assert!(cell.y >= 4 && cell.y <= 9);
    }
}

#[test]
fn test_get_random_cell_inside_margin_too_large() {
    let rect = GridRect::new(0, 0, 2, 2);
    let mut rng: StdRng = SeedableRng::seed_from_u64(7);
    let cell = rect.get_random_cell_inside(4, &mut rng);
    assert_eq!(cell, GridPos::new(4, 4));
}

#[test]
fn test_grid_pos_manhattan_and_rounding() {
    let a = GridPos::new(1, 1);
    assert_eq!(a.manhattan(GridPos::new(4, -1)), 5);
    assert_eq!(a.offset(-1, 2), GridPos::new(0, 3));
    assert_eq!(GridPos::from_f64(2.5, -2.5), GridPos::new(3, -3));
    assert_eq!(GridPos::from_f64(2.49, 7.51), GridPos::new(2, 8));
}

#[test]
fn test_circle_contains_is_strict() {
    let circle = Circle::new(5.0, 5.0, 2.0);
    assert!(circle.contains_cell(GridPos::new(5, 5)));
    assert!(circle.contains_cell(GridPos::new(6, 6)));
    assert!(!circle.contains_cell(GridPos::new(7, 5)));
    assert!(!circle.contains_point(5.0, 8.0));
}

#[test]
fn test_vector_length_and_normalize() {
    let mut v = Vector::planar(3.0, 4.0);
    assert_eq!(v.length(), 5.0);
    assert_eq!(v.length_squared(), 25.0);
    v.normalize();
    assert!((v.x - 0.6).abs() < EPS);
    assert!((v.y - 0.8).abs() < EPS);
    assert!((v.length() - 1.0).abs() < EPS);
}

#[test]
fn test_vector_null_stays_null() {
    let mut v = Vector::ZERO;
    v.normalize();
    assert_eq!(v, Vector::ZERO);
    assert_eq!(Vector::ZERO.normalized(), Vector::ZERO);
    assert_eq!(Vector::ZERO.length(), 0.0);
}

#[test]
fn test_vector_dot_and_cross() {
    let x = Vector::new(1.0, 0.0, 0.0);
    let y = Vector::new(0.0, 1.0, 0.0);
    assert_eq!(Vector::dot(&x, &y), 0.0);
    assert_eq!(Vector::cross(&x, &y), Vector::new(0.0, 0.0, 1.0));
    assert_eq!(Vector::cross(&y, &x), Vector::new(0.0, 0.0, -1.0));
    assert_eq!(Vector::dot(&Vector::new(1.0, 2.0, 3.0), &Vector::new(4.0, 5.0, 6.0)), 32.0);
}

#[test]
fn test_vector_angles() {
    let x = Vector::planar(1.0, 0.0);
    let y = Vector::planar(0.0, 1.0);
    assert!((x.angle_to(&y) - FRAC_PI_2).abs() < EPS);
    assert!((y.angle_to(&x) + FRAC_PI_2).abs() < EPS);
    assert!((Vector::scalar(&x, &y) - FRAC_PI_2).abs() < EPS);

    // Wraps into (-PI, PI].
    let a = Vector::planar(-1.0, 0.1);
    let b = Vector::planar(-1.0, -0.1);
    assert!(a.angle_to(&b) > 0.0);
    assert!(a.angle_to(&b) < PI);
    assert!((Vector::planar(-1.0, 0.0).polar_angle() - PI).abs() < EPS);
}

#[test]
fn test_vector_normals_and_scaling() {
    let v = Vector::planar(2.0, 1.0);
    assert_eq!(v.left_normal(), Vector::planar(-1.0, 2.0));
    assert_eq!(v.right_normal(), Vector::planar(1.0, -2.0));
    assert_eq!(v.scaled(3.0), Vector::planar(6.0, 3.0));
    assert_eq!(2.0 * v, v * 2.0);
    assert_eq!(v / 2.0, Vector::planar(1.0, 0.5));
}

#[test]
fn test_vector_operators() {
    let mut v = Vector::new(1.0, 2.0, 3.0);
    v += Vector::new(1.0, 1.0, 1.0);
    assert_eq!(v, Vector::new(2.0, 3.0, 4.0));
    v -= Vector::new(2.0, 2.0, 2.0);
    assert_eq!(v, Vector::new(0.0, 1.0, 2.0));
    v *= Vector::new(5.0, 5.0, 0.5);
    assert_eq!(v, Vector::new(0.0, 5.0, 1.0));
    v /= 0.5;
    assert_eq!(v, Vector::new(0.0, 10.0, 2.0));
    assert_eq!(-v, Vector::new(0.0, -10.0, -2.0));
    assert_eq!(v.to_string(), "0/10/2");
}
