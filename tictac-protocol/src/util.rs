/// Implements [`Display`](core::fmt::Display) for a bitflags type as its set flag names, separated by spaces.
macro_rules! flag_names_display {
    ($flag_struct:ty) => {
        impl ::core::fmt::Display for $flag_struct {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                if self.is_empty() {
                    return f.write_str("no flags set");
                }

                for (index, (name, _)) in self.iter_names().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(name)?;
                }

                Ok(())
            }
        }
    };
}

pub(crate) use flag_names_display;
