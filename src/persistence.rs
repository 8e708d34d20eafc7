//! Line-oriented genome DNA files.
//!
//! Each line is `Key: value`. A file holds the genome header, then every
//! neuron gene, then every link gene:
//!
//! ```text
//! GenomeID: 7
//! NumInputs: 2
//! NumOutputs: 1
//! NetDepth: 2
//! NumNeuronGenes: 4
//! NeuronGeneID: 0
//! NeuronGeneType: Input
//! Recurrent: False
//! ActivationResponse: 1
//! SplitX: 0.5
//! SplitY: 0
//! ...
//! NumLinkGenes: 3
//! LinkGeneInnovationID: 4
//! FromNeuronID: 0
//! ToNeuronID: 3
//! Weight: -0.25
//! Enabled: True
//! Recurrent: False
//! ...
//! ```
//!
//! Fitness, spawn amount and species are not stored; they read back as zero.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{NeatError, Result};
use crate::gene::{InnovationId, LinkGene, NeuronGene, NeuronId, NeuronType, Placement};
use crate::genome::Genome;

/// File extension appended by [`save`].
pub const DNA_EXTENSION: &str = "dna";

/// Write `genome` in DNA format.
///
/// # Errors
///
/// Returns [`NeatError::Io`] if the writer fails.
pub fn write_dna<W: Write>(genome: &Genome, mut out: W) -> Result<()> {
    write!(out, "{}", Dna(genome))?;
    out.flush()?;
    Ok(())
}

/// Render `genome` in DNA format.
#[must_use]
pub fn to_dna_string(genome: &Genome) -> String {
    Dna(genome).to_string()
}

struct Dna<'a>(&'a Genome);

impl fmt::Display for Dna<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genome = self.0;
        writeln!(f, "GenomeID: {}", genome.id())?;
        writeln!(f, "NumInputs: {}", genome.num_inputs())?;
        writeln!(f, "NumOutputs: {}", genome.num_outputs())?;
        match genome.depth() {
            Some(depth) => writeln!(f, "NetDepth: {depth}")?,
            None => writeln!(f, "NetDepth: -1")?,
        }

        writeln!(f, "NumNeuronGenes: {}", genome.num_neurons())?;
        for neuron in genome.neurons() {
            writeln!(f, "NeuronGeneID: {}", neuron.id)?;
            writeln!(f, "NeuronGeneType: {}", type_name(neuron.neuron_type))?;
            writeln!(f, "Recurrent: {}", bool_name(neuron.recurrent))?;
            writeln!(f, "ActivationResponse: {}", neuron.activation_response)?;
            writeln!(f, "SplitX: {}", neuron.placement.width)?;
            writeln!(f, "SplitY: {}", neuron.placement.depth)?;
        }

        writeln!(f, "NumLinkGenes: {}", genome.num_links())?;
        for link in genome.links() {
            writeln!(f, "LinkGeneInnovationID: {}", link.innovation)?;
            writeln!(f, "FromNeuronID: {}", link.from)?;
            writeln!(f, "ToNeuronID: {}", link.to)?;
            writeln!(f, "Weight: {}", link.weight)?;
            writeln!(f, "Enabled: {}", bool_name(link.enabled))?;
            writeln!(f, "Recurrent: {}", bool_name(link.recurrent))?;
        }
        Ok(())
    }
}

/// Parse a genome in DNA format.
///
/// # Errors
///
/// Returns [`NeatError::MalformedGenome`] for a missing line, an unexpected
/// key, an unparsable value, input or output counts that disagree with the
/// neuron genes, a link to an unknown neuron or link genes out of innovation
/// order. Returns [`NeatError::Io`] if the reader fails.
pub fn read_dna<R: BufRead>(reader: R) -> Result<Genome> {
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    DnaParser::new(&lines).genome()
}

/// Parse a genome from a DNA string.
///
/// # Errors
///
/// See [`read_dna`].
pub fn from_dna_str(text: &str) -> Result<Genome> {
    read_dna(text.as_bytes())
}

/// Write `genome` to `<path>.dna` and return the full path.
///
/// # Errors
///
/// Returns [`NeatError::Io`] if the file cannot be created or written.
pub fn save(genome: &Genome, path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut full = path.as_ref().as_os_str().to_owned();
    full.push(".");
    full.push(DNA_EXTENSION);
    let full = PathBuf::from(full);

    let file = File::create(&full)?;
    write_dna(genome, BufWriter::new(file))?;
    Ok(full)
}

/// Read a genome from a DNA file at exactly `path`.
///
/// # Errors
///
/// See [`read_dna`].
pub fn load(path: impl AsRef<Path>) -> Result<Genome> {
    let file = File::open(path)?;
    read_dna(BufReader::new(file))
}

fn type_name(neuron_type: NeuronType) -> &'static str {
    match neuron_type {
        NeuronType::Input => "Input",
        NeuronType::Hidden => "Hidden",
        NeuronType::Output => "Output",
        NeuronType::Bias => "Bias",
    }
}

fn bool_name(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

struct DnaParser<'a> {
    lines: &'a [String],
    cursor: usize,
}

impl<'a> DnaParser<'a> {
    fn new(lines: &'a [String]) -> Self {
        Self { lines, cursor: 0 }
    }

    fn malformed(&self, reason: impl Into<String>) -> NeatError {
        NeatError::MalformedGenome {
            line: self.cursor,
            reason: reason.into(),
        }
    }

    /// Value of the next line, which must carry `key`.
    fn field(&mut self, key: &str) -> Result<&'a str> {
        let Some(line) = self.lines.get(self.cursor) else {
            self.cursor += 1;
            return Err(self.malformed(format!("expected `{key}`, found end of input")));
        };
        self.cursor += 1;

        let (found, value) = line
            .split_once(':')
            .ok_or_else(|| self.malformed(format!("expected `{key}: <value>`, found `{line}`")))?;
        if found.trim() != key {
            return Err(self.malformed(format!("expected `{key}`, found `{}`", found.trim())));
        }
        Ok(value.trim())
    }

    fn parsed<T: FromStr>(&mut self, key: &str) -> Result<T> {
        let value = self.field(key)?;
        value
            .parse()
            .map_err(|_| self.malformed(format!("invalid {key} `{value}`")))
    }

    fn flag(&mut self, key: &str) -> Result<bool> {
        match self.field(key)? {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(self.malformed(format!("invalid {key} `{other}`"))),
        }
    }

    fn neuron_type(&mut self) -> Result<NeuronType> {
        match self.field("NeuronGeneType")? {
            "Input" => Ok(NeuronType::Input),
            "Hidden" => Ok(NeuronType::Hidden),
            "Output" => Ok(NeuronType::Output),
            "Bias" => Ok(NeuronType::Bias),
            other => Err(self.malformed(format!("unknown neuron type `{other}`"))),
        }
    }

    /// A link endpoint, which must name a neuron gene already read.
    fn neuron_ref(&mut self, key: &str, known: &HashSet<NeuronId>) -> Result<NeuronId> {
        let id = self.parsed(key)?;
        if known.contains(&id) {
            Ok(id)
        } else {
            Err(self.malformed(format!("{key} {id} names no neuron gene")))
        }
    }

    fn genome(&mut self) -> Result<Genome> {
        let id = self.parsed("GenomeID")?;
        let num_inputs: usize = self.parsed("NumInputs")?;
        let inputs_line = self.cursor;
        let num_outputs: usize = self.parsed("NumOutputs")?;
        let outputs_line = self.cursor;
        let depth: i64 = self.parsed("NetDepth")?;

        let num_neurons: usize = self.parsed("NumNeuronGenes")?;
        let mut neurons = Vec::with_capacity(num_neurons.min(self.lines.len()));
        for _ in 0..num_neurons {
            let id = self.parsed("NeuronGeneID")?;
            let neuron_type = self.neuron_type()?;
            let recurrent = self.flag("Recurrent")?;
            let activation_response = self.parsed("ActivationResponse")?;
            let split_x = self.parsed("SplitX")?;
            let split_y = self.parsed("SplitY")?;
            neurons.push(NeuronGene {
                id,
                neuron_type,
                recurrent,
                placement: Placement::new(split_y, split_x),
                activation_response,
            });
        }

        let count = |role: NeuronType| neurons.iter().filter(|n| n.neuron_type == role).count();
        let (inputs, outputs) = (count(NeuronType::Input), count(NeuronType::Output));
        if inputs != num_inputs {
            return Err(NeatError::MalformedGenome {
                line: inputs_line,
                reason: format!("NumInputs is {num_inputs} but {inputs} input neurons follow"),
            });
        }
        if outputs != num_outputs {
            return Err(NeatError::MalformedGenome {
                line: outputs_line,
                reason: format!("NumOutputs is {num_outputs} but {outputs} output neurons follow"),
            });
        }

        let known: HashSet<NeuronId> = neurons.iter().map(|n| n.id).collect();
        let num_links: usize = self.parsed("NumLinkGenes")?;
        let mut links: Vec<LinkGene> = Vec::with_capacity(num_links.min(self.lines.len()));
        for _ in 0..num_links {
            let innovation: InnovationId = self.parsed("LinkGeneInnovationID")?;
            if let Some(previous) = links.last().map(|l| l.innovation) {
                if innovation < previous {
                    return Err(self.malformed(format!(
                        "link innovation {innovation} follows {previous}"
                    )));
                }
            }
            let from = self.neuron_ref("FromNeuronID", &known)?;
            let to = self.neuron_ref("ToNeuronID", &known)?;
            let weight = self.parsed("Weight")?;
            let enabled = self.flag("Enabled")?;
            let recurrent = self.flag("Recurrent")?;
            let mut link = LinkGene::new(innovation, from, to, weight, recurrent);
            link.enabled = enabled;
            links.push(link);
        }

        if let Some(extra) = self.lines[self.cursor.min(self.lines.len())..]
            .iter()
            .find(|line| !line.trim().is_empty())
        {
            self.cursor += 1;
            return Err(self.malformed(format!("unexpected trailing line `{extra}`")));
        }

        let mut genome = Genome::from_genes(id, neurons, links, num_inputs, num_outputs);
        if let Ok(depth) = usize::try_from(depth) {
            genome.set_depth(depth);
        }
        Ok(genome)
    }
}
