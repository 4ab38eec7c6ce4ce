/*!

This is the long-form manual for `instant_runoff` and `polltally`.

## The tally in one paragraph

A poll offers a set of options; every voter submits one ballot ranking the
options in order of preference. Counting proceeds in rounds: each ballot
credits one vote to its highest-ranked option still standing. An option
holding at least `floor(ballots / 2) + 1` votes wins outright. Otherwise the
options with the lowest count are removed and their ballots transfer to the
voters' next choices. With two options left the higher count wins directly,
and equal counts end the poll in a declared tie.

## Poll description format

`polltally` reads a single JSON file describing the poll:

```text
{
  "poll": { "title": "Team beverage" },
  "options": [
    { "id": 1, "text": "Coffee" },
    { "id": 2, "text": "Tea" }
  ],
  "ballots": [
    { "id": "b1", "rankings": [ { "optionId": 1, "rank": 1 },
                                { "optionId": 2, "rank": 2 } ] },
    { "id": "b2", "rankings": [ { "option": { "id": 2, "text": "Tea" }, "rank": 1 },
                                { "optionId": 1, "rank": 2 } ] }
  ]
}
```

A ranking refers to its option either through `optionId` or through an
embedded `option` record. The two notations are equivalent and may be mixed
freely within one file; rankings do not have to be sorted by rank.

## CSV ballots

Additional ballots can be supplied with `--ballots <file>`. Each row is one
ballot: option texts in descending preference order, blank cells skipped.

```text
Coffee,Tea
Tea,Coffee
Coffee,
```

Ballot ids are synthesized from the file name and line number. A text that
does not name a registered option is an error.

## Output summary

The summary is written as JSON to stdout or to the `--out` location: the
winner (or the tied options), the total number of ballots, the majority
threshold, and one record per round with tallies, percentages, remaining
options and eliminations. With `--reference <file>`, the computed summary is
compared against a reference summary and any difference is reported as an
error.

*/
