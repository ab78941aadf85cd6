// src/encode/hadamard/wht.rs

/// Unnormalized Walsh–Hadamard transform in natural (Sylvester) order.
///
/// `data.len()` must be a power of two. Output index 0 is the sum of the input.
pub fn fwht(data: &mut [i32]) {
    let n = data.len();
    debug_assert!(n.is_power_of_two(), "WHT length {} is not a power of two", n);
    let mut h = 1;
    while h < n {
        for start in (0..n).step_by(h * 2) {
            for i in start..start + h {
                let a = data[i];
                let b = data[i + h];
                data[i] = a + b;
                data[i + h] = a - b;
            }
        }
        h *= 2;
    }
}

/// The transform is its own inverse up to a factor of `n`.
pub fn inverse_fwht(data: &mut [i32]) {
    let n = data.len() as i32;
    fwht(data);
    for v in data.iter_mut() {
        *v /= n;
    }
}
