/// Implements the arithmetic operator traits for single-field newtypes.
///
/// * `op!(binary T, Add, add)` gives `T + T -> T`
/// * `op!(inplace T, AddAssign, add_assign)` gives `T += T`
/// * `op!(unary T, Neg, neg)` gives `-T`
#[macro_export]
macro_rules! op {
    (binary $t:ty, $imp:ident, $method:ident) => {
        impl $imp for $t {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };
    (inplace $t:ty, $imp:ident, $method:ident) => {
        impl $imp for $t {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0)
            }
        }
    };
    (unary $t:ty, $imp:ident, $method:ident) => {
        impl $imp for $t {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
