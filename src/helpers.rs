// Expands a 5-bit color channel (0-31) to 8 bits.
pub fn scale_color(c: u8) -> u8 {
    ((c as u16) * 255 / 31) as u8
}

// Division rounding toward negative infinity. `b` must be positive.
pub fn floor_div(a: i32, b: i32) -> i32 {
    a.div_euclid(b)
}
