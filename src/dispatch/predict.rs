//! Prediction: fill the missing cells of a data set.
use log::debug;

use crate::data::Data;
use crate::fallback::ml_impute;
use crate::model::{Model, ModelError, ModelResult};

/// Fill every NaN cell of `data` and return the completed data set.
///
/// Without `data`, a single row of `dsize` NaN cells is predicted. The
/// `predict` capability runs first; a replacement it returns is passed back
/// as is. Any NaN left after the capability (or all of them, without one)
/// is filled by maximum-likelihood imputation.
///
/// # Errors
/// - `Dimension` if `data` is absent and `dsize` is data-width or zero.
/// - Errors from the capability or from imputation.
pub fn predict(data: Option<Data>, model: &Model<'_>) -> ModelResult<Data> {
    let mut data = match data {
        Some(data) => data,
        None => match model.dsize.fixed() {
            Some(width) if width > 0 => Data::filled(1, width, f64::NAN),
            _ => return Err(ModelError::Dimension { model: model.name.clone(), field: "dsize" }),
        },
    };
    if let Some(cap) = &model.capabilities.predict {
        if let Some(replacement) = cap.predict(&mut data, model)? {
            return Ok(replacement);
        }
    }
    let remaining = data.nan_count();
    if remaining > 0 {
        debug!("{}: imputing {remaining} missing cells by maximum likelihood", model.name);
        ml_impute(&mut data, model)?;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{multivariate_normal, normal, pmf};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The capability fills the gaps and no imputation is needed.
    //
    // Given
    // -----
    // - N(2, 1) and data [1, NaN, NaN].
    //
    // Expect
    // ------
    // - [1, 2, 2].
    fn capability_fills_in_place() {
        let out = predict(Some(Data::from_vector(array![1.0, f64::NAN, f64::NAN])), &normal::with_parameters(2.0, 1.0))
            .unwrap();
        assert_eq!(out.vector, Some(array![1.0, 2.0, 2.0]));
    }

    #[test]
    // Purpose
    // -------
    // Without data, a row of `dsize` cells is predicted at the mode.
    //
    // Given
    // -----
    // - A 3-dimensional MVN with mean (1, -1, 0.5); no data.
    //
    // Expect
    // ------
    // - A 1×3 matrix without NaN, close to the mean.
    fn missing_data_predicts_one_row() {
        // Arrange
        let model = multivariate_normal::with_parameters(
            array![1.0, -1.0, 0.5],
            array![[1.0, 0.2, 0.0], [0.2, 1.0, 0.1], [0.0, 0.1, 2.0]],
        );

        // Act
        let out = predict(None, &model).unwrap();

        // Assert
        let row = out.matrix.as_ref().unwrap();
        assert_eq!(row.dim(), (1, 3));
        assert_eq!(out.nan_count(), 0);
        assert_abs_diff_eq!(row[[0, 0]], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(row[[0, 1]], -1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(row[[0, 2]], 0.5, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // A data-width model cannot size a prediction without data.
    //
    // Given
    // -----
    // - An unprepared PMF model.
    //
    // Expect
    // ------
    // - `Dimension` naming `dsize`.
    fn data_width_without_data_fails() {
        let err = predict(None, &pmf::model()).unwrap_err();
        assert_eq!(err, ModelError::Dimension { model: pmf::NAME.to_string(), field: "dsize" });
    }
}
