use li_core::Image;

/// Uniform `level` image with whole rows set to `value`.
pub fn with_rows(width: usize, height: usize, level: u16, rows: &[(usize, u16)]) -> Image<u16> {
    let mut data = vec![level; width * height];
    for &(y, value) in rows {
        data[y * width..(y + 1) * width].fill(value);
    }
    Image::from_vec(width, height, data).expect("valid image")
}

/// Sets whole columns of `img` to `value`.
pub fn paint_cols(img: Image<u16>, cols: &[usize], value: u16) -> Image<u16> {
    let (w, h) = (img.width(), img.height());
    let mut data = img.into_vec();
    for y in 0..h {
        for &x in cols {
            data[y * w + x] = value;
        }
    }
    Image::from_vec(w, h, data).expect("valid image")
}

/// Sets `row` to `value` for columns in `cols` only.
pub fn paint_segment(
    img: Image<u16>,
    row: usize,
    cols: std::ops::Range<usize>,
    value: u16,
) -> Image<u16> {
    let (w, h) = (img.width(), img.height());
    let mut data = img.into_vec();
    data[row * w + cols.start..row * w + cols.end].fill(value);
    Image::from_vec(w, h, data).expect("valid image")
}
