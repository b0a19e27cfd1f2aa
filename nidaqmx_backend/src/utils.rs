use ndarray::{Array, Dimension};
use numpy::{Element, PyArray, PyArrayDyn};
use pyo3::prelude::*;
use pyo3::types::IntoPyDict;

// Accepts anything numpy can turn into an array of `dtype`: arrays of other dtypes, nested
// lists, python scalars (as 0-d arrays).
pub fn as_array<'py, T: Element>(
    py: Python<'py>,
    data: &'py PyAny,
    dtype: &str,
) -> PyResult<&'py PyArrayDyn<T>> {
    let kwargs = [("dtype", dtype)].into_py_dict(py);
    let arr = py
        .import("numpy")?
        .call_method("asarray", (data,), Some(kwargs))?;
    Ok(arr.downcast::<PyArrayDyn<T>>()?)
}

pub fn to_pyarray<T: Element, D: Dimension>(py: Python<'_>, arr: Array<T, D>) -> PyObject {
    PyArray::from_owned_array(py, arr).to_object(py)
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;
    use numpy::PyReadonlyArrayDyn;

    #[test]
    fn python_data_becomes_arrays() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let list = vec![vec![1, 2], vec![3, 4]].to_object(py);
            let arr = as_array::<f64>(py, list.as_ref(py), "float64").unwrap();
            let view: PyReadonlyArrayDyn<f64> = arr.readonly();
            assert_eq!(view.shape(), &[2, 2]);
            assert_eq!(view.as_array()[[1, 0]], 3.0);

            let scalar = 1.5f64.to_object(py);
            let arr = as_array::<f64>(py, scalar.as_ref(py), "float64").unwrap();
            assert_eq!(arr.ndim(), 0);

            let bools = vec![true, false, true].to_object(py);
            let arr = as_array::<u8>(py, bools.as_ref(py), "uint8").unwrap();
            assert_eq!(arr.readonly().as_array().iter().copied().collect::<Vec<_>>(), [1, 0, 1]);
        });
    }

    #[test]
    fn arrays_reach_python() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let obj = to_pyarray(py, arr2(&[[1u32, 2], [3, 4]]));
            let shape: Vec<usize> = obj.getattr(py, "shape").unwrap().extract(py).unwrap();
            assert_eq!(shape, vec![2, 2]);
        });
    }
}
